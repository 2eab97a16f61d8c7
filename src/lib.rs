//! Nagai Agrotrade API Library
//!
//! Investment marketplace backend: accounts, the investment ledger,
//! payment-gateway callbacks, notifications and transactional email.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod state;

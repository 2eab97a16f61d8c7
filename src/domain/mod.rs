// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod account;
pub mod banking;
pub mod catalog;
pub mod ledger;
pub mod notification;
pub mod pagination;
pub mod ports;
pub mod repositories;
pub mod stats;

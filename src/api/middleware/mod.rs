// Request guards
// Bearer-token authentication and role checks as extractors

pub mod auth;

pub use auth::{AdminUser, AuthUser, InvestorUser};

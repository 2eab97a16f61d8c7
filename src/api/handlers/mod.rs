// HTTP handlers
// One module per route group

pub mod account;
pub mod admin_dashboard;
pub mod contact;
pub mod dashboard;
pub mod notifications;
pub mod trading;

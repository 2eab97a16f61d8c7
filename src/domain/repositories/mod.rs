// Repository traits (ports)
// Implemented by the Postgres and in-memory adapters in infrastructure

pub mod account_repository;
pub mod banking_repository;
pub mod catalog_repository;
pub mod errors;
pub mod ledger_repository;
pub mod notification_repository;

pub use account_repository::AccountRepository;
pub use banking_repository::BankingRepository;
pub use catalog_repository::{NewsRepository, OpportunityRepository};
pub use errors::{RepositoryError, RepositoryResult};
pub use ledger_repository::{
    Credited, Holding, LedgerRepository, Purchase, SaleApproved, SaleRecorded, TransactionRecord,
};
pub use notification_repository::NotificationRepository;

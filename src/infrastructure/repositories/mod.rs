// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod postgres_account_repository;
pub mod postgres_banking_repository;
pub mod postgres_catalog_repository;
pub mod postgres_ledger_repository;
pub mod postgres_notification_repository;

pub use postgres_account_repository::PostgresAccountRepository;
pub use postgres_banking_repository::PostgresBankingRepository;
pub use postgres_catalog_repository::{PostgresNewsRepository, PostgresOpportunityRepository};
pub use postgres_ledger_repository::PostgresLedgerRepository;
pub use postgres_notification_repository::PostgresNotificationRepository;

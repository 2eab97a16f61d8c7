// In-memory adapters
// Back the HTTP test-suite and local runs without Postgres or Redis

pub mod accounts;
pub mod banking;
pub mod catalog;
pub mod ledger;
pub mod mailer;
pub mod notifications;
pub mod payments;
pub mod token_store;

pub use accounts::MemoryAccountRepository;
pub use banking::MemoryBankingRepository;
pub use catalog::{MemoryNewsRepository, MemoryOpportunityRepository};
pub use ledger::MemoryLedgerRepository;
pub use mailer::RecordingMailer;
pub use notifications::MemoryNotificationRepository;
pub use payments::ScriptedGateway;
pub use token_store::MemoryTokenStore;

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::account::{Account, Email, NewAccount};
use crate::domain::pagination::{Page, Pagination};

/// Repository trait for accounts and their profiles
///
/// `create` fails with `Conflict` when the email or username is taken.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account together with its empty profile
    async fn create(&self, account: NewAccount) -> RepositoryResult<Account>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Account>>;

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>>;

    async fn mark_verified(&self, id: Uuid) -> RepositoryResult<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()>;

    /// Persist username and profile fields
    async fn update_profile(&self, account: &Account) -> RepositoryResult<()>;

    /// Delete an account; owned rows cascade
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    /// Newest accounts first
    async fn list(&self, window: Pagination) -> RepositoryResult<Page<Account>>;
}

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::notification::Notification;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> RepositoryResult<()>;

    /// Newest first
    async fn list_for(&self, account_id: Uuid) -> RepositoryResult<Vec<Notification>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Notification>>;

    async fn mark_read(&self, id: Uuid) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::repositories::{NotificationRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
pub struct MemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> RepositoryResult<()> {
        self.notifications.write().push(notification.clone());
        Ok(())
    }

    async fn list_for(&self, account_id: Uuid) -> RepositoryResult<Vec<Notification>> {
        let mut items: Vec<Notification> = self
            .notifications
            .read()
            .iter()
            .filter(|n| n.account_id == account_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        Ok(self.notifications.read().iter().find(|n| n.id == id).cloned())
    }

    async fn mark_read(&self, id: Uuid) -> RepositoryResult<()> {
        let mut items = self.notifications.write();
        let notification = items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Notification".to_string()))?;
        notification.read = true;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut items = self.notifications.write();
        let before = items.len();
        items.retain(|n| n.id != id);
        if items.len() == before {
            return Err(RepositoryError::NotFound("Notification".to_string()));
        }
        Ok(())
    }
}

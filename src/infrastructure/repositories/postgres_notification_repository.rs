use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::repositories::{NotificationRepository, RepositoryError, RepositoryResult};

/// PostgreSQL implementation of NotificationRepository
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: &Notification) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, account_id, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.id)
        .bind(notification.account_id)
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for(&self, account_id: Uuid) -> RepositoryResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, account_id, message, read, created_at
            FROM notifications
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        let row = sqlx::query_as::<_, Notification>(
            "SELECT id, account_id, message, read, created_at FROM notifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_read(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Notification".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Notification".to_string()));
        }
        Ok(())
    }
}

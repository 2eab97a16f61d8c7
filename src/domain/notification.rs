use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// In-app message for one account
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub account_id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(account_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::ports::{CacheError, TokenStore};

/// Login sessions kept in the token store as `session:{sid}` -> account id
///
/// Logout deletes the key, which invalidates every access token that
/// carries the session id.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(store: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(session_id: Uuid) -> String {
        format!("session:{}", session_id)
    }

    /// Opens a session and returns its id
    pub async fn open(&self, account_id: Uuid) -> Result<Uuid, CacheError> {
        let session_id = Uuid::new_v4();
        self.store
            .set_if_absent(&Self::key(session_id), &account_id.to_string(), self.ttl)
            .await?;
        Ok(session_id)
    }

    /// True while the session exists and belongs to `account_id`
    pub async fn is_active(&self, session_id: Uuid, account_id: Uuid) -> Result<bool, CacheError> {
        let owner = self.store.get(&Self::key(session_id)).await?;
        Ok(owner.as_deref() == Some(account_id.to_string().as_str()))
    }

    pub async fn close(&self, session_id: Uuid) -> Result<bool, CacheError> {
        self.store.delete(&Self::key(session_id)).await
    }
}

/// Single-use tokens emailed for verification and password reset
///
/// Stored as `{prefix}-{token}` -> email. Consuming a token deletes it.
#[derive(Clone)]
pub struct OneTimeTokens {
    store: Arc<dyn TokenStore>,
    prefix: String,
    ttl: Duration,
}

impl OneTimeTokens {
    pub fn new(store: Arc<dyn TokenStore>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
        }
    }

    fn key(&self, token: Uuid) -> String {
        format!("{}-{}", self.prefix, token)
    }

    /// Issues a fresh token for `email`
    pub async fn issue(&self, email: &str) -> Result<Uuid, CacheError> {
        loop {
            let token = Uuid::new_v4();
            if self.store.set_if_absent(&self.key(token), email, self.ttl).await? {
                return Ok(token);
            }
        }
    }

    /// Returns the email behind a token and deletes it
    ///
    /// Only the caller whose delete removed the key gets the email, so a
    /// token raced by two requests is honoured once.
    pub async fn consume(&self, token: Uuid) -> Result<Option<String>, CacheError> {
        let key = self.key(token);
        let Some(email) = self.store.get(&key).await? else {
            return Ok(None);
        };
        if self.store.delete(&key).await? {
            Ok(Some(email))
        } else {
            Ok(None)
        }
    }
}

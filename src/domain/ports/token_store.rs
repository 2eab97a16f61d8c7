use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Short-lived key/value storage for one-time tokens and sessions
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store `value` under `key` unless the key exists
    ///
    /// # Returns
    /// `true` when the value was written
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// # Returns
    /// `true` when a key was removed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::ports::{CacheError, TokenStore};

/// Process-local token store with per-key expiry
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, (_, expires)| *expires > now);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock();
        Ok(entries
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.lock().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_if_absent_does_not_overwrite() {
        let store = MemoryTokenStore::new();
        assert!(store.set_if_absent("k", "a", Duration::from_secs(60)).await.unwrap());
        assert!(!store.set_if_absent("k", "b", Duration::from_secs(60)).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn expired_keys_disappear() {
        let store = MemoryTokenStore::new();
        store.set_if_absent("k", "a", Duration::from_millis(0)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.set_if_absent("k", "b", Duration::from_secs(60)).await.unwrap());
    }
}

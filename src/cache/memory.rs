//! In-process store implementation backed by DashMap.
//!
//! Mirrors the subset of Redis semantics the log cache relies on: hashes
//! disappear once their last field is removed, and string keys expire after
//! their TTL. Expiry is checked lazily on read using the tokio clock, so a
//! paused test runtime can advance past it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::{CacheError, KeyValueStore};

struct ExpiringValue {
    value: String,
    expires_at: Instant,
}

/// In-memory store with per-key expiry.
#[derive(Default)]
pub struct MemoryStore {
    hashes: DashMap<String, HashMap<String, Vec<u8>>>,
    strings: DashMap<String, ExpiringValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn hget(&self, hash: &str, field: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self
            .hashes
            .get(hash)
            .and_then(|fields| fields.get(field).cloned()))
    }

    async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.hashes
            .entry(hash.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hdel(&self, hash: &str, field: &str) -> Result<(), CacheError> {
        if let Some(mut fields) = self.hashes.get_mut(hash) {
            fields.remove(field);
        }
        self.hashes.remove_if(hash, |_, fields| fields.is_empty());
        Ok(())
    }

    async fn hkeys(&self, hash: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .hashes
            .get(hash)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if self
            .strings
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            return Ok(None);
        }
        Ok(self.strings.get(key).map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.strings.insert(
            key.to_string(),
            ExpiringValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_fields_are_independent_per_bucket() {
        let store = MemoryStore::new();
        store.hset("matches", "1", b"a".to_vec()).await.unwrap();
        store.hset("logs", "1", b"b".to_vec()).await.unwrap();

        assert_eq!(store.hget("matches", "1").await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.hget("logs", "1").await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.hget("players", "1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_hdel_removes_empty_hash() {
        let store = MemoryStore::new();
        store.hset("matches", "7", b"x".to_vec()).await.unwrap();
        store.hdel("matches", "7").await.unwrap();

        assert!(store.hkeys("matches").await.unwrap().is_empty());
        assert!(!store.hashes.contains_key("matches"));
    }

    #[tokio::test]
    async fn test_hdel_missing_field_is_noop() {
        let store = MemoryStore::new();
        store.hdel("matches", "404").await.unwrap();
        assert!(store.hkeys("matches").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_string_key_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_ex("match-3", "boom", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("match-3").await.unwrap().as_deref(), Some("boom"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("match-3").await.unwrap(), None);
        assert!(!store.strings.contains_key("match-3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_ex_resets_expiry() {
        let store = MemoryStore::new();
        store
            .set_ex("match-3", "first", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        store
            .set_ex("match-3", "second", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(store.get("match-3").await.unwrap().as_deref(), Some("second"));
    }
}

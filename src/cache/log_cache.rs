//! Log cache facade over a key-value store.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::{Bucket, CacheError, KeyValueStore};
use crate::config::settings::{CacheBackend, CacheConfig};
use crate::models::{LogSet, MatchPage};

/// How long a failed match stays suppressed.
pub const ERROR_MATCH_EXPIRE: Duration = Duration::from_secs(3 * 60 * 60);

fn error_key(match_id: i64) -> String {
    format!("match-{}", match_id)
}

/// Persistence for log sets, player mappings, match pages and cached
/// processing failures.
///
/// Every call is a direct pass-through to the store. Nothing is retried and
/// multi-step operations are not atomic:
///
/// - [`LogCache::delete_logs`] reads and then deletes in two round trips, so a
///   `set_logs` landing between them is deleted without being returned.
/// - [`LogCache::set_match`] writes ids one by one and stops at the first
///   failure, leaving earlier ids written.
#[derive(Clone)]
pub struct LogCache {
    store: Arc<dyn KeyValueStore>,
}

impl LogCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Create a log cache backed by the configured store.
    pub async fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn KeyValueStore> = match config.backend {
            CacheBackend::Redis => Arc::new(RedisStore::new(&config.redis).await?),
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::info!(backend = ?config.backend, "Log cache initialized");
        Ok(Self::new(store))
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }

    // ========================================================================
    // Log sets
    // ========================================================================

    pub async fn get_logs(&self, match_id: i64) -> Result<LogSet, CacheError> {
        tracing::debug!(match_id, "Reading log set");
        self.get_json(Bucket::Matches, &match_id.to_string()).await
    }

    pub async fn set_logs(&self, match_id: i64, log_set: &LogSet) -> Result<(), CacheError> {
        tracing::debug!(match_id, logs = log_set.logs.len(), "Storing log set");
        let value = encode(log_set)?;
        self.store
            .hset(Bucket::Matches.as_str(), &match_id.to_string(), value)
            .await
    }

    /// Remove a log set and return what was stored.
    pub async fn delete_logs(&self, match_id: i64) -> Result<LogSet, CacheError> {
        let log_set = self.get_logs(match_id).await?;
        self.store
            .hdel(Bucket::Matches.as_str(), &match_id.to_string())
            .await?;
        tracing::debug!(match_id, "Deleted log set");
        Ok(log_set)
    }

    // ========================================================================
    // Cached processing failures
    // ========================================================================

    /// Record that processing `match_id` failed with `err`.
    ///
    /// Overwrites any earlier failure and restarts the suppression window.
    pub async fn set_log_error(&self, match_id: i64, err: impl Display) -> Result<(), CacheError> {
        let message = err.to_string();
        tracing::debug!(match_id, error = %message, "Caching log processing failure");
        self.store
            .set_ex(&error_key(match_id), &message, ERROR_MATCH_EXPIRE)
            .await
    }

    /// Succeeds unless a failure for `match_id` is still cached, in which case
    /// it returns [`CacheError::CachedFailure`] with the recorded text.
    pub async fn check_log_error(&self, match_id: i64) -> Result<(), CacheError> {
        match self.store.get(&error_key(match_id)).await? {
            None => Ok(()),
            Some(message) => {
                tracing::debug!(match_id, "Cached log processing failure found");
                Err(CacheError::CachedFailure(message))
            }
        }
    }

    // ========================================================================
    // Players
    // ========================================================================

    pub async fn get_player(&self, player_id: &str) -> Result<String, CacheError> {
        let bytes = self
            .store
            .hget(Bucket::Players.as_str(), player_id)
            .await?
            .ok_or_else(|| CacheError::not_found(Bucket::Players.as_str(), player_id))?;
        String::from_utf8(bytes).map_err(|e| CacheError::Decode(e.to_string()))
    }

    pub async fn set_player(&self, player_id: &str, steam_id: &str) -> Result<(), CacheError> {
        tracing::debug!(player_id, steam_id, "Storing player mapping");
        self.store
            .hset(Bucket::Players.as_str(), player_id, steam_id.as_bytes().to_vec())
            .await
    }

    // ========================================================================
    // Match pages
    // ========================================================================

    pub async fn get_match(&self, log_id: i64) -> Result<MatchPage, CacheError> {
        tracing::debug!(log_id, "Reading match page");
        self.get_json(Bucket::Logs, &log_id.to_string()).await
    }

    /// Store `match_page` under each of `log_ids`, in order.
    pub async fn set_match(&self, log_ids: &[i64], match_page: &MatchPage) -> Result<(), CacheError> {
        let value = encode(match_page)?;
        for log_id in log_ids {
            self.store
                .hset(Bucket::Logs.as_str(), &log_id.to_string(), value.clone())
                .await?;
        }
        tracing::debug!(match_id = match_page.match_id, ?log_ids, "Stored match page");
        Ok(())
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// List the fields of the bucket named `bucket`.
    ///
    /// The name is validated before the store is contacted.
    pub async fn get_all_keys(&self, bucket: &str) -> Result<HashSet<String>, CacheError> {
        let bucket: Bucket = bucket.parse()?;
        self.keys(bucket).await
    }

    pub async fn keys(&self, bucket: Bucket) -> Result<HashSet<String>, CacheError> {
        let keys = self.store.hkeys(bucket.as_str()).await?;
        Ok(keys.into_iter().collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        bucket: Bucket,
        field: &str,
    ) -> Result<T, CacheError> {
        let bytes = self
            .store
            .hget(bucket.as_str(), field)
            .await?
            .ok_or_else(|| CacheError::not_found(bucket.as_str(), field))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use jiff::Timestamp;

    use crate::models::{PlayerSummary, RawLog, TeamSummary};

    /// Counts every call and fails `hset` once `fail_hset_after` writes have
    /// succeeded.
    #[derive(Default)]
    struct ScriptedStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        writes: AtomicUsize,
        fail_hset_after: Option<usize>,
        fail_reads: bool,
    }

    impl ScriptedStore {
        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn read_guard(&self) -> Result<(), CacheError> {
            self.touch();
            if self.fail_reads {
                return Err(CacheError::Connection("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KeyValueStore for ScriptedStore {
        async fn hget(&self, hash: &str, field: &str) -> Result<Option<Vec<u8>>, CacheError> {
            self.read_guard()?;
            self.inner.hget(hash, field).await
        }

        async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> Result<(), CacheError> {
            self.touch();
            let done = self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_hset_after.is_some_and(|limit| done >= limit) {
                return Err(CacheError::Operation("READONLY replica".to_string()));
            }
            self.inner.hset(hash, field, value).await
        }

        async fn hdel(&self, hash: &str, field: &str) -> Result<(), CacheError> {
            self.touch();
            self.inner.hdel(hash, field).await
        }

        async fn hkeys(&self, hash: &str) -> Result<Vec<String>, CacheError> {
            self.read_guard()?;
            self.inner.hkeys(hash).await
        }

        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.read_guard()?;
            self.inner.get(key).await
        }

        async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.touch();
            self.inner.set_ex(key, value, ttl).await
        }

        async fn ping(&self) -> Result<(), CacheError> {
            self.read_guard()
        }
    }

    fn memory_cache() -> LogCache {
        LogCache::new(Arc::new(MemoryStore::new()))
    }

    fn sample_log_set(match_id: i64) -> LogSet {
        LogSet {
            match_id,
            logs: vec![RawLog {
                log_id: 3_100_200,
                source: "logs.tf".to_string(),
                lines: vec![
                    "L 05/01/2024 - 20:00:00: World triggered \"Round_Start\"".to_string(),
                    "L 05/01/2024 - 20:30:00: World triggered \"Game_Over\"".to_string(),
                ],
            }],
            uploaded_at: "2024-05-01T20:31:00Z".parse::<Timestamp>().unwrap(),
        }
    }

    fn sample_match_page() -> MatchPage {
        MatchPage {
            match_id: 77,
            log_ids: vec![1, 2, 3],
            map: "cp_process_f12".to_string(),
            duration_secs: 1800,
            teams: vec![
                TeamSummary {
                    name: "RED".to_string(),
                    score: 5,
                },
                TeamSummary {
                    name: "BLU".to_string(),
                    score: 3,
                },
            ],
            players: vec![PlayerSummary {
                steam_id: "[U:1:22202]".to_string(),
                name: "scout".to_string(),
                team: "RED".to_string(),
                kills: 31,
                deaths: 12,
                damage: 9120,
            }],
            rendered_at: "2024-05-01T21:00:00Z".parse::<Timestamp>().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_set_then_get_logs() {
        let cache = memory_cache();
        let log_set = sample_log_set(10);

        cache.set_logs(10, &log_set).await.unwrap();
        assert_eq!(cache.get_logs(10).await.unwrap(), log_set);
    }

    #[tokio::test]
    async fn test_set_logs_overwrites() {
        let cache = memory_cache();
        cache.set_logs(10, &sample_log_set(10)).await.unwrap();

        let mut replacement = sample_log_set(10);
        replacement.logs.clear();
        cache.set_logs(10, &replacement).await.unwrap();

        assert!(cache.get_logs(10).await.unwrap().logs.is_empty());
    }

    #[tokio::test]
    async fn test_get_logs_missing_is_not_found() {
        let cache = memory_cache();
        let err = cache.get_logs(404).await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::NotFound { ref bucket, ref field } if bucket == "matches" && field == "404"
        ));
    }

    #[tokio::test]
    async fn test_get_logs_with_wrong_shape_is_decode_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .hset("matches", "5", br#"{"unexpected":true}"#.to_vec())
            .await
            .unwrap();
        let cache = LogCache::new(store);

        assert!(matches!(
            cache.get_logs(5).await,
            Err(CacheError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_logs_returns_previous_value() {
        let cache = memory_cache();
        let log_set = sample_log_set(20);
        cache.set_logs(20, &log_set).await.unwrap();

        assert_eq!(cache.delete_logs(20).await.unwrap(), log_set);
        assert!(cache.get_logs(20).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_logs_is_not_found_and_skips_delete() {
        let store = Arc::new(ScriptedStore::default());
        let cache = LogCache::new(store.clone());

        assert!(cache.delete_logs(1).await.unwrap_err().is_not_found());
        // Only the read happened.
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_log_error_is_cached() {
        let cache = memory_cache();
        assert!(cache.check_log_error(9).await.is_ok());

        cache
            .set_log_error(9, "no round start found")
            .await
            .unwrap();

        let err = cache.check_log_error(9).await.unwrap_err();
        assert!(err.is_cached_failure());
        assert!(matches!(err, CacheError::CachedFailure(ref text) if text == "no round start found"));
        assert!(cache.check_log_error(10).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_error_uses_match_key() {
        let store = Arc::new(MemoryStore::new());
        let cache = LogCache::new(store.clone());
        cache
            .set_log_error(123, std::io::Error::other("parse failed"))
            .await
            .unwrap();

        assert_eq!(
            store.get("match-123").await.unwrap().as_deref(),
            Some("parse failed")
        );
    }

    #[tokio::test]
    async fn test_negative_ids_use_decimal_keys() {
        let store = Arc::new(MemoryStore::new());
        let cache = LogCache::new(store.clone());

        cache.set_logs(-42, &sample_log_set(-42)).await.unwrap();
        cache.set_match(&[-1], &sample_match_page()).await.unwrap();
        cache.set_log_error(-42, "bad upload").await.unwrap();

        assert!(store.hget("matches", "-42").await.unwrap().is_some());
        assert!(store.hget("logs", "-1").await.unwrap().is_some());
        assert_eq!(
            store.get("match--42").await.unwrap().as_deref(),
            Some("bad upload")
        );
        assert_eq!(cache.get_logs(-42).await.unwrap().match_id, -42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_error_expires_after_window() {
        let cache = memory_cache();
        cache.set_log_error(9, "timeout").await.unwrap();

        tokio::time::advance(ERROR_MATCH_EXPIRE - Duration::from_secs(1)).await;
        assert!(cache.check_log_error(9).await.is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.check_log_error(9).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_log_error_resets_window() {
        let cache = memory_cache();
        cache.set_log_error(9, "first").await.unwrap();
        tokio::time::advance(Duration::from_secs(2 * 60 * 60)).await;
        cache.set_log_error(9, "second").await.unwrap();
        tokio::time::advance(Duration::from_secs(2 * 60 * 60)).await;

        let err = cache.check_log_error(9).await.unwrap_err();
        assert!(matches!(err, CacheError::CachedFailure(ref text) if text == "second"));
    }

    #[tokio::test]
    async fn test_check_log_error_surfaces_store_failure() {
        let store = Arc::new(ScriptedStore {
            fail_reads: true,
            ..ScriptedStore::default()
        });
        let cache = LogCache::new(store);

        let err = cache.check_log_error(1).await.unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_cached_failure());
    }

    #[tokio::test]
    async fn test_player_mapping_upsert() {
        let cache = memory_cache();
        assert!(cache.get_player("etf2l-1").await.unwrap_err().is_not_found());

        cache.set_player("etf2l-1", "76561197960287930").await.unwrap();
        assert_eq!(cache.get_player("etf2l-1").await.unwrap(), "76561197960287930");

        cache.set_player("etf2l-1", "76561197960287931").await.unwrap();
        assert_eq!(cache.get_player("etf2l-1").await.unwrap(), "76561197960287931");
    }

    #[tokio::test]
    async fn test_set_match_writes_every_log_id() {
        let cache = memory_cache();
        let page = sample_match_page();

        cache.set_match(&[1, 2, 3], &page).await.unwrap();

        for log_id in [1, 2, 3] {
            assert_eq!(cache.get_match(log_id).await.unwrap(), page);
        }
        assert!(cache.get_match(4).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_set_match_stops_at_first_failed_write() {
        let store = Arc::new(ScriptedStore {
            fail_hset_after: Some(1),
            ..ScriptedStore::default()
        });
        let cache = LogCache::new(store.clone());
        let page = sample_match_page();

        let err = cache.set_match(&[1, 2, 3], &page).await.unwrap_err();
        assert!(matches!(err, CacheError::Operation(_)));

        // The first write stays committed, the third is never attempted.
        assert_eq!(cache.get_match(1).await.unwrap(), page);
        assert!(cache.get_match(2).await.unwrap_err().is_not_found());
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_set_match_with_no_ids_is_noop() {
        let store = Arc::new(ScriptedStore::default());
        let cache = LogCache::new(store.clone());

        cache.set_match(&[], &sample_match_page()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_all_keys_lists_bucket_fields() {
        let cache = memory_cache();
        cache.set_logs(10, &sample_log_set(10)).await.unwrap();
        cache.set_logs(20, &sample_log_set(20)).await.unwrap();
        cache.set_player("p", "s").await.unwrap();

        let keys = cache.get_all_keys("matches").await.unwrap();
        let expected: HashSet<String> = ["10", "20"].into_iter().map(String::from).collect();
        assert_eq!(keys, expected);

        assert!(cache.get_all_keys("logs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_keys_rejects_unknown_bucket_without_store_access() {
        let store = Arc::new(ScriptedStore::default());
        let cache = LogCache::new(store.clone());

        let err = cache.get_all_keys("bogus").await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidBucket(ref name) if name == "bogus"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_from_config_memory_backend() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            ..CacheConfig::default()
        };
        let cache = LogCache::from_config(&config).await.unwrap();
        cache.ping().await.unwrap();
        cache.set_player("a", "b").await.unwrap();
        assert_eq!(cache.get_player("a").await.unwrap(), "b");
    }
}

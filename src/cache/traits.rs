//! KeyValueStore trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheError;

/// Trait for the store primitives the log cache is built on.
///
/// Backends map these one-to-one onto native commands; none of them retry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a field from a hash.
    async fn hget(&self, hash: &str, field: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Write a field into a hash, replacing any existing value.
    async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Remove a field from a hash.
    async fn hdel(&self, hash: &str, field: &str) -> Result<(), CacheError>;

    /// List the field names currently present in a hash.
    async fn hkeys(&self, hash: &str) -> Result<Vec<String>, CacheError>;

    /// Read a plain string key.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a plain string key that expires after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Round trip to the store.
    async fn ping(&self) -> Result<(), CacheError>;
}

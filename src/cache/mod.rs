//! Cache module providing persistence for match logs on top of a key-value store.
//!
//! [`LogCache`] is the entry point. It talks to a [`KeyValueStore`], which is
//! either:
//! - Redis (`RedisStore`, pooled with bb8), used in deployments
//! - Memory (`MemoryStore`, in-process), used for local runs and tests
//!
//! # Store layout
//!
//! | Key | Type | Contents |
//! |-----|------|----------|
//! | `matches` | hash | match id -> JSON log set |
//! | `players` | hash | player id -> steam id |
//! | `logs` | hash | log id -> JSON match page |
//! | `match-<id>` | string, 3h TTL | text of the last processing failure |
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"  # or "memory"
//!
//! [cache.redis]
//! url = "redis://127.0.0.1:6379"
//! pool_size = 4
//! connection_timeout = 5
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let cache = LogCache::from_config(&settings.cache).await?;
//! match cache.check_log_error(match_id).await {
//!     Ok(()) => process(match_id).await,
//!     Err(e) if e.is_cached_failure() => skip(match_id),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

mod bucket;
mod error;
mod log_cache;
mod memory;
mod redis;
mod traits;

pub use bucket::Bucket;
pub use error::CacheError;
pub use log_cache::{ERROR_MATCH_EXPIRE, LogCache};
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use traits::KeyValueStore;

// Re-export config types
pub use crate::config::settings::{CacheBackend, CacheConfig, RedisCacheConfig};

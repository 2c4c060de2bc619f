//! Redis store implementation using bb8 connection pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bb8::{ErrorSink, Pool, PooledConnection, RunError};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::Notify;

use crate::cache::{CacheError, KeyValueStore};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

fn operation_error(e: RedisError) -> CacheError {
    CacheError::Operation(e.to_string())
}

/// Last connect error seen by the pool.
///
/// bb8 opens connections in background tasks and only reports a timeout to
/// the waiting caller, so the real cause is captured here.
#[derive(Debug, Clone, Default)]
struct ConnectFailures {
    last: Arc<Mutex<Option<String>>>,
    notify: Arc<Notify>,
}

impl ConnectFailures {
    fn take(&self) -> Option<String> {
        self.last.lock().ok().and_then(|mut last| last.take())
    }

    fn connect_error(&self) -> CacheError {
        CacheError::Connection(
            self.take()
                .unwrap_or_else(|| "no connection available before timeout".to_string()),
        )
    }
}

impl ErrorSink<RedisError> for ConnectFailures {
    fn sink(&self, error: RedisError) {
        tracing::warn!(error = %error, "Redis connection attempt failed");
        if let Ok(mut last) = self.last.lock() {
            *last = Some(error.to_string());
        }
        self.notify.notify_waiters();
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<RedisError>> {
        Box::new(self.clone())
    }
}

/// Redis-backed store with bb8 connection pool.
///
/// Connections are opened lazily and a failed connect is not retried: the
/// caller waiting for it gets the connect error as [`CacheError::Connection`].
pub struct RedisStore {
    pool: RedisPool,
    failures: ConnectFailures,
}

impl RedisStore {
    /// Build a store for `config.url`.
    ///
    /// The URL is parsed before the pool is created, so a malformed URL fails
    /// here without touching the network.
    pub async fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let failures = ConnectFailures::default();
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .retry_connection(false)
            .error_sink(Box::new(failures.clone()))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::debug!(pool_size = config.pool_size, "Redis connection pool created");

        Ok(Self { pool, failures })
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        // Must be enabled before `pool.get()` spawns the connect task.
        let failed = self.failures.notify.notified();
        tokio::pin!(failed);
        failed.as_mut().enable();

        tokio::select! {
            biased;
            conn = self.pool.get() => conn.map_err(|e| match e {
                RunError::User(e) => CacheError::Connection(e.to_string()),
                RunError::TimedOut => self.failures.connect_error(),
            }),
            _ = failed => Err(self.failures.connect_error()),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn hget(&self, hash: &str, field: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.hget(hash, field).await.map_err(operation_error)
    }

    async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .hset::<_, _, _, ()>(hash, field, value)
            .await
            .map_err(operation_error)
    }

    async fn hdel(&self, hash: &str, field: &str) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .hdel::<_, _, ()>(hash, field)
            .await
            .map_err(operation_error)
    }

    async fn hkeys(&self, hash: &str) -> Result<Vec<String>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.hkeys(hash).await.map_err(operation_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.get(key).await.map_err(operation_error)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(operation_error)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let _: String = redis::cmd("PING")
            .query_async(conn_ref)
            .await
            .map_err(operation_error)?;
        Ok(())
    }
}

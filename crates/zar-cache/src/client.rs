//! Typed client over the pooled Redis connection.

use crate::error::CacheError;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;
use serde::Serialize;
use zar_core::config::RedisConfig;

/// Key prefix for rate-limit counters.
pub const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// Key prefix for cached domain-safety verdicts.
pub const SAFE_DOMAINS_PREFIX: &str = "safe_domains:";

/// Shared handle to the key/value store. Cheap to clone.
#[derive(Clone)]
pub struct CacheClient {
    pool: Pool,
}

/// Result of the cache health probe.
#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub status: &'static str,
    pub ping: bool,
    pub write_test: bool,
}

impl CacheClient {
    /// Open a connection pool against the configured server.
    pub fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let pool =
            PoolConfig::from_url(config.connection_url()).create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    /// Fetch a string value.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.get(key).await?)
    }

    /// Store a value without expiry.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// Store a value with a TTL in seconds.
    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    /// Delete a single key.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Delete every key matching the pattern. Admin-only; KEYS walks the
    /// whole keyspace, so callers must keep patterns prefixed.
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = self.pool.get().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        conn.del::<_, ()>(&keys).await?;
        Ok(keys.len())
    }

    /// Count keys under a prefix. Admin-only, same KEYS caveat as above.
    pub async fn count_keys(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = self.pool.get().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys.len())
    }

    /// Atomically increment a counter and refresh its window in a single
    /// round-trip, returning `(count, ttl_secs)`.
    pub async fn incr_with_window(
        &self,
        key: &str,
        window_secs: i64,
    ) -> Result<(i64, i64), CacheError> {
        let mut conn = self.pool.get().await?;
        let (count, _, ttl): (i64, i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_secs)
            .ttl(key)
            .query_async(&mut conn)
            .await?;
        Ok((count, ttl))
    }

    /// Round-trip liveness probe.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Ping plus a write/read/delete cycle under `{prefix}health_check`.
    pub async fn health_check(&self, prefix: &str) -> CacheHealth {
        let ping = self.ping().await.is_ok();
        let key = format!("{prefix}health_check");
        let write_test = match self.set_ex(&key, "test_value", 10).await {
            Ok(()) => {
                let read = self.get(&key).await.ok().flatten();
                let _ = self.delete(&key).await;
                read.as_deref() == Some("test_value")
            }
            Err(_) => false,
        };
        CacheHealth {
            status: if ping && write_test {
                "healthy"
            } else {
                "unhealthy"
            },
            ping,
            write_test,
        }
    }
}

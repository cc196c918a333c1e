//! Recommendation cache layer
//!
//! Provides the key-value contract consumed by the recommendation engine:
//! - String get/set-with-TTL/delete for serialized recommendation blobs
//! - Counters and sorted sets for popularity tracking
//! - A unified key schema shared by the read and write paths
//! - Metrics integration
//!
//! Values are opaque strings; callers own the serialization format.

mod error;
mod keys;
mod metrics;

pub use error::{CacheError, CacheResult};
pub use keys::CacheKey;
pub use metrics::CacheMetrics;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};

/// Default TTL values (seconds)
pub mod ttl {
    pub const RECOMMENDATION: u64 = 3600; // 1 hour
}

/// Core cache operations consumed by the recommendation engine.
///
/// Implementations must be safe to call concurrently from many request
/// tasks. None of the operations retry internally.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a raw value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a raw value with a TTL in seconds.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Increment an integer counter and return the new value.
    async fn incr(&self, key: &str) -> CacheResult<i64>;

    /// Add `delta` to a member's score in a sorted set and return the new score.
    async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> CacheResult<f64>;

    /// Top `n` members of a sorted set, highest score first.
    async fn ztop(&self, key: &str, n: usize) -> CacheResult<Vec<String>>;
}

/// Redis-backed cache client
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    metrics: CacheMetrics,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            metrics: CacheMetrics::new(),
        }
    }

    /// Open a managed connection from a `redis://` URL
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    /// Ping Redis to check connection health
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| {
                warn!(error = %e, "Redis PING failed");
                CacheError::Redis(e)
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record_hit(key);
                Ok(Some(data))
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                self.metrics.record_miss(key);
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis get error");
                self.metrics.record_error(key, "redis");
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| {
                self.metrics.record_error(key, "redis");
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl = ttl_secs, "Cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| {
            self.metrics.record_error(key, "redis");
            CacheError::Redis(e)
        })?;

        debug!(key = %key, "Cache delete");
        self.metrics.record_invalidation(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1i64).await.map_err(|e| {
            self.metrics.record_error(key, "redis");
            CacheError::Redis(e)
        })?;
        Ok(value)
    }

    async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> CacheResult<f64> {
        let mut conn = self.conn.clone();
        let score: f64 = conn.zincr(key, member, delta).await.map_err(|e| {
            self.metrics.record_error(key, "redis");
            CacheError::Redis(e)
        })?;
        Ok(score)
    }

    async fn ztop(&self, key: &str, n: usize) -> CacheResult<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .zrevrange(key, 0, n as isize - 1)
            .await
            .map_err(|e| {
                self.metrics.record_error(key, "redis");
                CacheError::Redis(e)
            })?;
        Ok(members)
    }
}

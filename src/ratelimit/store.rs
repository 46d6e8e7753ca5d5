// Counter stores backing the rate limiter
//
// The store is a plain key/value counter with a TTL: the proxy never
// deletes a counter, it simply lets the store expire it. An expired
// counter is indistinguishable from one that never existed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value of the counter, or None when it never existed or
    /// has expired.
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError>;

    /// Increment the counter and return the new value, writing `ttl`
    /// as the counter's expiry. The increment itself is atomic per
    /// backend, the surrounding check-then-increment is not.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u32, StoreError>;
}

/// In-process store for single-instance deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, (u32, Instant)>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        let counters = self.counters.lock();
        Ok(counters
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(count, _)| *count))
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<u32, StoreError> {
        let mut counters = self.counters.lock();
        let now = Instant::now();
        // Unlike Redis, nothing reaps this map on its own; dead buckets
        // from past half hours are dropped on each write.
        counters.retain(|_, (_, expires_at)| *expires_at > now);
        let entry = counters.entry(key.to_string()).or_insert((0, now + ttl));
        entry.0 += 1;
        Ok(entry.0)
    }
}

/// Shared store for multi-instance deployments.
#[derive(Clone, Debug)]
pub struct RedisCounterStore {
    client: redis::Client,
}

impl RedisCounterStore {
    pub fn new(url: impl AsRef<str>) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url.as_ref())?,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<u32, StoreError> {
        let mut conn = self.connection().await?;
        // INCR and EXPIRE travel in one transaction so a counter can
        // never exist without an expiry.
        let (count,): (u32,) = redis::pipe()
            .atomic()
            .incr(key, 1u32)
            .expire(key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}

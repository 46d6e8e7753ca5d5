// Time-bucketed request quota backed by a shared counter store

pub mod store;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use store::{CounterStore, StoreError};

/// Buckets are aligned to fixed half-hour boundaries, so a client gets a
/// fresh quota at :00 and :30 rather than a sliding window.
pub const BUCKET_WIDTH: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u32 },
    Limited { count: u32 },
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    quota: u32,
}

/// Counter key for one client in one bucket: `rl:<ip>:<hour>:<00|30>`.
pub fn bucket_key(ip: &str, now: DateTime<Utc>) -> String {
    let half = if now.minute() < 30 { "00" } else { "30" };
    format!("rl:{}:{}:{}", ip, now.format("%Y-%m-%dT%H"), half)
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, quota: u32) -> Self {
        Self { store, quota }
    }

    /// Read the counter for the client's current bucket; at or above the
    /// quota the request is refused without incrementing, otherwise the
    /// counter is bumped with a TTL of one bucket width.
    ///
    /// The read and the increment are separate store operations, so
    /// concurrent requests in the same bucket can both observe the
    /// pre-increment count. The quota is best-effort under bursts.
    pub async fn check(&self, ip: &str, now: DateTime<Utc>) -> Result<RateDecision, StoreError> {
        let key = bucket_key(ip, now);
        let count = self.store.get(&key).await?.unwrap_or(0);
        if count >= self.quota {
            return Ok(RateDecision::Limited { count });
        }
        let count = self.store.incr(&key, BUCKET_WIDTH).await?;
        Ok(RateDecision::Allowed { count })
    }
}

//! In-process cache implementation.

use super::service::CacheService;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    value: Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.inserted_at + self.ttl
    }
}

/// Cache held in the gateway's own address space.
///
/// Staleness is checked lazily: an entry past its TTL is removed by the first
/// read that observes it. Entries are never evicted otherwise.
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Creates an empty cache whose entries live for `default_ttl` unless
    /// [`CacheService::set`] is given an explicit TTL.
    pub fn new(default_ttl: Duration) -> Self {
        debug!("Using in-process cache (TTL: {}s)", default_ttl.as_secs());
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                debug!("Cache HIT: {}", key);
                return Some(entry.value.clone());
            }
        } else {
            debug!("Cache MISS: {}", key);
            return None;
        }

        // A concurrent set may have replaced the entry since the read above.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        debug!("Cache EXPIRED: {}", key);
        None
    }

    async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                inserted_at: Instant::now(),
                ttl,
            },
        );
        debug!("Cache SET: {} (TTL: {}s)", key, ttl.as_secs());
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
impl MemoryCache {
    /// Number of stored entries, including expired ones not yet read.
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

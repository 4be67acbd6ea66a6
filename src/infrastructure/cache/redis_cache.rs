//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Namespace prefix for every key written by the gateway.
const KEY_PREFIX: &str = "topo:";

/// Redis cache shared by every gateway instance pointed at the same servers.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Payloads are stored as JSON strings with `SETEX`, so expiry is enforced by
/// Redis itself. All operations are fail-open: errors are logged but don't
/// propagate to callers.
///
/// With several servers configured, keys are spread across them by a stable
/// hash of the key, so every gateway instance reads a key from the same node.
pub struct RedisCache {
    shards: Vec<ConnectionManager>,
    default_ttl: Duration,
}

impl RedisCache {
    /// Connects to every reachable server in `redis_urls`, validating each
    /// with a PING, and shards keys across them.
    ///
    /// # Arguments
    ///
    /// - `redis_urls` - Redis connection strings (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl` - TTL applied when [`CacheService::set`] is called
    ///   with `ttl = None`; controlled via `CACHE_TTL_SECONDS`
    ///
    /// Unreachable servers are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if no server could be reached.
    pub async fn connect_all(redis_urls: &[String], default_ttl: Duration) -> CacheResult<Self> {
        let mut shards = Vec::with_capacity(redis_urls.len());

        for url in redis_urls {
            match Self::connect_node(url).await {
                Ok(manager) => shards.push(manager),
                Err(e) => warn!("Skipping cache server: {}", e),
            }
        }

        if shards.is_empty() {
            return Err(CacheError::ConnectionError(format!(
                "None of {} Redis servers reachable",
                redis_urls.len()
            )));
        }

        info!(
            "✓ Connected to Redis ({} of {} servers)",
            shards.len(),
            redis_urls.len()
        );

        Ok(Self {
            shards,
            default_ttl,
        })
    }

    async fn connect_node(redis_url: &str) -> CacheResult<ConnectionManager> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        Ok(manager)
    }

    fn build_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    /// Connection for the node that owns `key`.
    fn connection(&self, key: &str) -> ConnectionManager {
        self.shards[shard_index(key, self.shards.len())].clone()
    }
}

/// Stable shard assignment: the same key maps to the same node in every process.
fn shard_index(key: &str, shards: usize) -> usize {
    if shards <= 1 {
        return 0;
    }

    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);

    (u64::from_be_bytes(prefix) % shards as u64) as usize
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let redis_key = Self::build_key(key);
        let mut conn = self.connection(key);

        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("Cache HIT: {}", key);
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry for {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) {
        let redis_key = Self::build_key(key);
        let mut conn = self.connection(key);
        // SETEX rejects a zero expiry.
        let ttl_seconds = ttl.unwrap_or(self.default_ttl).as_secs().max(1);

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cannot serialize cache entry for {}: {}", key, e);
                return;
            }
        };

        match conn.set_ex::<_, _, ()>(&redis_key, raw, ttl_seconds).await {
            Ok(_) => debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds),
            Err(e) => warn!("Redis SET error for {}: {}", key, e),
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn health_check(&self) -> bool {
        for shard in &self.shards {
            let mut conn = shard.clone();
            if conn.ping::<()>().await.is_err() {
                return false;
            }
        }
        true
    }
}

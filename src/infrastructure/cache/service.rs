//! Cache service trait and error types.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while setting up a cache backend.
///
/// Read and write paths never surface these; they degrade to a miss or a
/// no-op instead.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
}

/// Result type for cache setup.
pub type CacheResult<T> = Result<T, CacheError>;

/// TTL-bound key/value store for controller payloads.
///
/// Implementations must be thread-safe and atomic per key. Missing and
/// expired entries are indistinguishable to callers: both read as `None`.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process store
/// - [`crate::infrastructure::cache::RedisCache`] - Shared Redis store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached value for `key` if present and unexpired.
    ///
    /// Backend errors are logged and treated as a miss.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any existing entry.
    ///
    /// # Arguments
    ///
    /// - `key` - Site identifier or the all-sites sentinel
    /// - `value` - Payload to cache
    /// - `ttl` - Entry lifetime (implementation default if `None`)
    ///
    /// Failures are logged and never reach the caller.
    async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>);

    /// Short name of the backing store, reported in `X-Cache-Type`.
    fn backend_name(&self) -> &'static str;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}

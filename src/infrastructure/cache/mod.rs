//! Read-through cache for controller payloads.
//!
//! Provides a [`CacheService`] trait with two interchangeable implementations:
//! - [`MemoryCache`] - In-process store, the default
//! - [`RedisCache`] - Shared Redis store for multi-instance deployments

mod memory_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};

#[cfg(test)]
pub use service::MockCacheService;

//! Query cache
//!
//! List and public queries are cached per table under keys of the form
//! `<table>:<kind>:<query>`. Any write to a table drops every key under
//! `<table>:*`.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache backend operations
///
/// The generic methods keep this trait from being object safe; services
/// hold the concrete [`Cache`] instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values whose key matches a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Shared query cache with the configured TTL
#[derive(Debug)]
pub struct Cache {
    inner: MemoryCache,
    ttl: Duration,
}

impl Cache {
    pub fn new(inner: MemoryCache) -> Self {
        let ttl = inner.default_ttl();
        Self { inner, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store with the configured TTL
    pub async fn put<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        self.inner.set(key, value, self.ttl).await
    }
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        self.inner.get(key).await
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        tracing::debug!("Invalidating cache keys matching {}", pattern);
        self.inner.delete_pattern(pattern).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(Cache::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        ttl,
    )))
}

/// Cache for tests: default capacity, five minute TTL
pub fn create_test_cache() -> Arc<Cache> {
    Arc::new(Cache::new(MemoryCache::new()))
}

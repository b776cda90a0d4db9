//! Cache configuration.
//!
//! Selects the backend (`memory` or `redis`) and its parameters from the
//! `[cache]` settings section.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Deserialize;

use super::redis::RedisCache;
use super::store::{CacheError, KeyValueCache, MemoryCache};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Maximum entries held by the in-process backend.
    pub capacity: usize,
    /// Connection URL, required when `backend = "redis"`.
    pub redis_url: Option<String>,
    /// Namespace prepended to every Redis key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            capacity: DEFAULT_CAPACITY,
            redis_url: None,
            key_prefix: String::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            capacity: settings.capacity,
            redis_url: settings.redis_url.clone(),
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Build the configured backend. Redis connections are verified with a PING.
    pub async fn connect(&self) -> Result<Arc<dyn KeyValueCache>, CacheError> {
        match self.backend {
            CacheBackend::Memory => Ok(Arc::new(MemoryCache::new(self))),
            CacheBackend::Redis => {
                let url = self
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| CacheError::backend("redis backend requires `redis_url`"))?;
                let cache = RedisCache::connect(url, &self.key_prefix).await?;
                Ok(Arc::new(cache))
            }
        }
    }
}

//! Key-value cache backends.
//!
//! Values are opaque JSON strings. Neither backend expires entries on its own
//! schedule; the in-process store only drops the least recently used key once
//! its capacity is reached.

use std::sync::RwLock;

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("failed to encode cache value: {0}")]
    Encode(String),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Minimal `get`/`set` contract against a string keyed store.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
}

/// In-process LRU backend.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, String>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        // LRU bookkeeping mutates on read.
        Ok(rw_write(&self.entries, SOURCE, "get").get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), value);
        Ok(())
    }
}

//! Plantlog read-through cache.
//!
//! List and detail queries are cached as JSON strings under deterministic keys
//! derived from the query shape. Two backends are available:
//!
//! - **memory**: an in-process LRU map, bounded by `capacity`
//! - **redis**: an external Redis server shared between instances
//!
//! Entries are never invalidated by writes; stale pages are served until the
//! backend drops them.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! key_prefix = "plantlog:"
//! ```

mod config;
mod keys;
mod lock;
mod read_through;
mod redis;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use keys::CacheKey;
pub use read_through::ReadThrough;
pub use self::redis::RedisCache;
pub use store::{CacheError, KeyValueCache, MemoryCache};

pub use read_through::{METRIC_CACHE_HIT, METRIC_CACHE_MISS};

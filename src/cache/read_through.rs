//! Read-through orchestration: serve a cached copy or compute, store and return.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::keys::CacheKey;
use super::store::{CacheError, KeyValueCache};

pub const METRIC_CACHE_HIT: &str = "plantlog_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "plantlog_cache_miss_total";

#[derive(Clone)]
pub struct ReadThrough {
    store: Arc<dyn KeyValueCache>,
}

impl ReadThrough {
    pub fn new(store: Arc<dyn KeyValueCache>) -> Self {
        Self { store }
    }

    /// Return the value cached under `key`, or run `producer`, cache its
    /// result and return it.
    ///
    /// A cached value that no longer decodes as `T` counts as a miss and is
    /// overwritten. Producer errors are returned unchanged and nothing is
    /// cached for them.
    pub async fn fetch<T, E, F, Fut>(&self, key: &CacheKey, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let rendered = key.to_string();
        if let Some(value) = self.lookup::<T>(key, &rendered).await? {
            return Ok(value);
        }

        let value = producer().await?;
        self.store_value(&rendered, &value).await?;
        Ok(value)
    }

    /// Like [`ReadThrough::fetch`], for lookups that may find nothing. An
    /// absent result is returned without being cached.
    pub async fn fetch_optional<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        producer: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let rendered = key.to_string();
        if let Some(value) = self.lookup::<T>(key, &rendered).await? {
            return Ok(Some(value));
        }

        let value = producer().await?;
        if let Some(found) = value.as_ref() {
            self.store_value(&rendered, found).await?;
        }
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        rendered: &str,
    ) -> Result<Option<T>, CacheError> {
        let entity = key.entity();
        let Some(raw) = self.store.get(rendered).await? else {
            counter!(METRIC_CACHE_MISS, "entity" => entity).increment(1);
            debug!(key = rendered, entity, "Cache miss");
            return Ok(None);
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "entity" => entity).increment(1);
                debug!(key = rendered, entity, "Cache hit");
                Ok(Some(value))
            }
            Err(err) => {
                counter!(METRIC_CACHE_MISS, "entity" => entity).increment(1);
                warn!(
                    key = rendered,
                    entity,
                    error = %err,
                    "Discarding undecodable cache entry"
                );
                Ok(None)
            }
        }
    }

    async fn store_value<T: Serialize>(&self, rendered: &str, value: &T) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(value).map_err(CacheError::encode)?;
        self.store.set(rendered, encoded).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde::Deserialize;
    use uuid::Uuid;

    use super::*;
    use crate::cache::config::CacheConfig;
    use crate::cache::store::MemoryCache;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
    }

    #[derive(Debug)]
    enum TestError {
        Cache,
        Producer,
    }

    impl From<CacheError> for TestError {
        fn from(_: CacheError) -> Self {
            TestError::Cache
        }
    }

    fn read_through() -> (ReadThrough, Arc<MemoryCache>) {
        let store = Arc::new(MemoryCache::new(&CacheConfig::default()));
        (ReadThrough::new(store.clone()), store)
    }

    fn item(name: &str) -> Item {
        Item {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn miss_stores_exactly_the_producer_value() {
        let (cache, store) = read_through();
        let key = CacheKey::Plant(Uuid::nil());

        let value: Item = cache
            .fetch(&key, || async { Ok::<_, TestError>(item("fern")) })
            .await
            .unwrap();
        assert_eq!(value, item("fern"));

        let raw = store.get(&key.to_string()).await.unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Item>(&raw).unwrap(), item("fern"));
    }

    #[tokio::test]
    async fn hit_does_not_invoke_producer() {
        let (cache, _) = read_through();
        let key = CacheKey::Plant(Uuid::nil());
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Item = cache
                .fetch(&key, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(item("fern"))
                })
                .await
                .unwrap();
            assert_eq!(value, item("fern"));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn undecodable_entry_is_recomputed_and_overwritten() {
        let (cache, store) = read_through();
        let key = CacheKey::Plant(Uuid::nil());
        store
            .set(&key.to_string(), "not json".to_string())
            .await
            .unwrap();

        let value: Item = cache
            .fetch(&key, || async { Ok::<_, TestError>(item("moss")) })
            .await
            .unwrap();
        assert_eq!(value, item("moss"));

        let raw = store.get(&key.to_string()).await.unwrap().unwrap();
        assert_eq!(raw, "{\"name\":\"moss\"}");
    }

    #[tokio::test]
    async fn producer_errors_propagate_and_nothing_is_cached() {
        let (cache, store) = read_through();
        let key = CacheKey::Plant(Uuid::nil());

        let result: Result<Item, TestError> = cache
            .fetch(&key, || async { Err(TestError::Producer) })
            .await;
        assert!(matches!(result, Err(TestError::Producer)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn absent_detail_is_not_cached() {
        let (cache, store) = read_through();
        let key = CacheKey::HealthLog(Uuid::nil());

        let value: Option<Item> = cache
            .fetch_optional(&key, || async { Ok::<_, TestError>(None) })
            .await
            .unwrap();
        assert!(value.is_none());
        assert!(store.is_empty());

        let value: Option<Item> = cache
            .fetch_optional(&key, || async { Ok::<_, TestError>(Some(item("log"))) })
            .await
            .unwrap();
        assert_eq!(value, Some(item("log")));
        assert_eq!(store.len(), 1);
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueCache for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }
    }

    #[tokio::test]
    async fn backend_failures_surface_as_errors() {
        let cache = ReadThrough::new(Arc::new(BrokenStore));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<Item, TestError> = cache
            .fetch(&CacheKey::Plant(Uuid::nil()), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(item("fern"))
            })
            .await;

        assert!(matches!(result, Err(TestError::Cache)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}

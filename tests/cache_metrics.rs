use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;
use plantlog::cache::{
    CacheConfig, CacheError, CacheKey, METRIC_CACHE_HIT, METRIC_CACHE_MISS, MemoryCache,
    ReadThrough,
};
use uuid::Uuid;

#[tokio::test]
async fn read_through_emits_hit_and_miss_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let cache = ReadThrough::new(Arc::new(MemoryCache::new(&CacheConfig::default())));
    let plant_key = CacheKey::Plant(Uuid::new_v4());
    let log_key = CacheKey::HealthLog(Uuid::new_v4());

    for _ in 0..2 {
        let value: Result<String, CacheError> = cache
            .fetch(&plant_key, || async { Ok("fern".to_string()) })
            .await;
        assert_eq!(value.expect("cached value"), "fern");
    }
    let missing: Result<Option<String>, CacheError> =
        cache.fetch_optional(&log_key, || async { Ok(None) }).await;
    assert!(missing.expect("optional lookup").is_none());

    let observed: HashSet<(String, String)> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| {
            let key = composite_key.key();
            let entity = key
                .labels()
                .find(|label| label.key() == "entity")
                .map(|label| label.value().to_string())
                .unwrap_or_default();
            (key.name().to_string(), entity)
        })
        .collect();

    let expected = [
        (METRIC_CACHE_MISS, "plant"),
        (METRIC_CACHE_HIT, "plant"),
        (METRIC_CACHE_MISS, "health_log"),
    ];
    for (name, entity) in expected {
        assert!(
            observed.contains(&(name.to_string(), entity.to_string())),
            "missing metric: {name}{{entity={entity}}}"
        );
    }
    assert!(!observed.contains(&(METRIC_CACHE_HIT.to_string(), "health_log".to_string())));
}

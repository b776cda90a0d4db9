//! Cache key definitions.
//!
//! Each key renders to the exact string stored in the backend, so keys written
//! by earlier deployments keep resolving.

use std::fmt;

use uuid::Uuid;

use crate::application::pagination::ListOptions;

/// Deterministic key for one cacheable query shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `plants/all?page={p}&limit={l}&sort={field}:{order}`
    PlantList(ListOptions),
    /// `plants/user/{user}?page={p}&limit={l}&sort={field}:{order}`
    PlantsByUser { user_id: String, options: ListOptions },
    /// `plant/{id}`
    Plant(Uuid),
    /// `healthlogs:all?page={p}&limit={l}&sort={field}:{order}`
    HealthLogList(ListOptions),
    /// `healthlogs:user:{user}?page={p}&limit={l}`
    HealthLogsByUser { user_id: String, page: u32, limit: u32 },
    /// `healthlogs:plant:{plant}?page={p}&limit={l}`
    HealthLogsByPlant { plant_id: Uuid, page: u32, limit: u32 },
    /// `healthlog/{id}`
    HealthLog(Uuid),
}

impl CacheKey {
    /// Metric label for the collection this key belongs to.
    pub fn entity(&self) -> &'static str {
        match self {
            CacheKey::PlantList(_) | CacheKey::PlantsByUser { .. } | CacheKey::Plant(_) => {
                "plant"
            }
            CacheKey::HealthLogList(_)
            | CacheKey::HealthLogsByUser { .. }
            | CacheKey::HealthLogsByPlant { .. }
            | CacheKey::HealthLog(_) => "health_log",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::PlantList(options) => write!(
                f,
                "plants/all?page={}&limit={}&sort={}:{}",
                options.page, options.limit, options.sort_field, options.sort_order
            ),
            CacheKey::PlantsByUser { user_id, options } => write!(
                f,
                "plants/user/{user_id}?page={}&limit={}&sort={}:{}",
                options.page, options.limit, options.sort_field, options.sort_order
            ),
            CacheKey::Plant(id) => write!(f, "plant/{id}"),
            CacheKey::HealthLogList(options) => write!(
                f,
                "healthlogs:all?page={}&limit={}&sort={}:{}",
                options.page, options.limit, options.sort_field, options.sort_order
            ),
            CacheKey::HealthLogsByUser {
                user_id,
                page,
                limit,
            } => write!(f, "healthlogs:user:{user_id}?page={page}&limit={limit}"),
            CacheKey::HealthLogsByPlant {
                plant_id,
                page,
                limit,
            } => write!(f, "healthlogs:plant:{plant_id}?page={page}&limit={limit}"),
            CacheKey::HealthLog(id) => write!(f, "healthlog/{id}"),
        }
    }
}

use std::sync::Arc;

use crate::application::health_logs::HealthLogService;
use crate::application::plants::PlantService;
use crate::application::repos::StoreHealth;
use crate::infra::uploads::ScratchStorage;

#[derive(Clone)]
pub struct ApiState {
    pub plants: Arc<PlantService>,
    pub health_logs: Arc<HealthLogService>,
    pub scratch: Arc<ScratchStorage>,
    pub store_health: Arc<dyn StoreHealth>,
}

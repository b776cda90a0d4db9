pub mod error;
pub mod handlers;
mod multipart;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use handlers::{health_logs, plants};

pub fn build_api_router() -> Router<ApiState> {
    let plant_routes = Router::new()
        .route("/getPlants", get(plants::list_plants))
        .route("/getPlant/{id}", get(plants::get_plant))
        .route("/getPlantsByUserId/{id}", get(plants::list_plants_by_user))
        .route("/createNewPlant", post(plants::create_plant))
        .route("/deletePlant/{id}", delete(plants::delete_plant))
        .route("/updatePlant/{id}", patch(plants::update_plant));

    let health_log_routes = Router::new()
        .route("/getHealthLogs", get(health_logs::list_health_logs))
        .route("/getHealthLog/{id}", get(health_logs::get_health_log))
        .route(
            "/getHealthLogsByUserId/{id}",
            get(health_logs::list_health_logs_by_user),
        )
        .route(
            "/getHealthLogsByPlantId/{id}",
            get(health_logs::list_health_logs_by_plant),
        )
        .route("/createNewHealthLog", post(health_logs::create_health_log))
        .route(
            "/deleteHealthLog/{id}",
            delete(health_logs::delete_health_log),
        )
        .route(
            "/updateHealthLog/{id}",
            patch(health_logs::update_health_log),
        );

    Router::new()
        .nest("/api/plant", plant_routes)
        .nest("/api/healthlog", health_log_routes)
}

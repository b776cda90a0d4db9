pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;

use middleware::{log_responses, set_request_context};

/// Assemble the full application router: API routes, health probes and the
/// shared logging middleware.
pub fn build_router(state: ApiState, upload_limit_bytes: usize) -> Router {
    let health_routes = Router::new()
        .route("/health", get(liveness))
        .route("/health/db", get(db_health));

    build_api_router()
        .merge(health_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload_limit_bytes))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn liveness() -> &'static str {
    "ok"
}

async fn db_health(State(state): State<ApiState>) -> Response {
    db_health_response(state.store_health.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

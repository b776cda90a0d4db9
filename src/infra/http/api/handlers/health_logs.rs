use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::health_logs::{CreateHealthLogCommand, UpdateHealthLogCommand};
use crate::infra::http::api::multipart;
use crate::infra::http::api::state::ApiState;

use super::super::error::ApiError;
use super::{ListQuery, parse_id};

const INVALID_ID: &str = "Invalid health log id";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateHealthLogRequest {
    pub user_id: Option<String>,
    pub plant_id: Option<String>,
    pub attachment: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    #[serde(rename = "dateOfDiagnosis")]
    pub date_of_diagnosis: Option<String>,
    #[serde(rename = "diagnosisByModel")]
    pub diagnosis_by_model: Option<String>,
}

impl From<UpdateHealthLogRequest> for UpdateHealthLogCommand {
    fn from(request: UpdateHealthLogRequest) -> Self {
        Self {
            user_id: request.user_id,
            plant_id: request.plant_id,
            attachment: request.attachment,
            name: request.name,
            comment: request.comment,
            date_of_diagnosis: request.date_of_diagnosis,
            diagnosis_by_model: request.diagnosis_by_model,
        }
    }
}

pub async fn list_health_logs(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.health_logs.list(&query.options()).await?;
    Ok(Json(page))
}

pub async fn get_health_log(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, INVALID_ID)?;
    let log = state.health_logs.find(id).await?;
    Ok(Json(log))
}

pub async fn list_health_logs_by_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .health_logs
        .list_by_user(&user_id, &query.options())
        .await?;
    Ok(Json(page))
}

pub async fn list_health_logs_by_plant(
    State(state): State<ApiState>,
    Path(plant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let plant_id = parse_id(&plant_id, "Invalid plant id")?;
    let page = state
        .health_logs
        .list_by_plant(plant_id, &query.options())
        .await?;
    Ok(Json(page))
}

pub async fn create_health_log(
    State(state): State<ApiState>,
    payload: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = multipart::collect(&state.scratch, payload).await?;
    let scratch_path = form.file.as_ref().map(|file| file.path.clone());

    let command = CreateHealthLogCommand {
        user_id: form.take("user_id"),
        plant_id: form.take("plant_id"),
        name: form.take("name"),
        comment: form.take("comment"),
        date_of_diagnosis: form.take("dateOfDiagnosis"),
        image: form.file.take(),
    };
    let result = state.health_logs.create(command).await;

    if let Some(path) = scratch_path {
        state.scratch.discard_quietly(&path).await;
    }

    let log = result?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn update_health_log(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateHealthLogRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, INVALID_ID)?;
    let Json(request) = payload?;
    let log = state.health_logs.update(id, request.into()).await?;
    Ok(Json(log))
}

pub async fn delete_health_log(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, INVALID_ID)?;
    let deleted = state.health_logs.delete(id).await?;
    Ok(Json(deleted))
}

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::plants::{CreatePlantCommand, UpdatePlantCommand};
use crate::infra::http::api::multipart;
use crate::infra::http::api::state::ApiState;

use super::super::error::ApiError;
use super::{ListQuery, parse_id};

const INVALID_ID: &str = "Invalid plant id";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePlantRequest {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub species: Option<String>,
    #[serde(rename = "dateOfPlanting")]
    pub date_of_planting: Option<String>,
    pub comment: Option<String>,
    pub image: Option<String>,
}

impl From<UpdatePlantRequest> for UpdatePlantCommand {
    fn from(request: UpdatePlantRequest) -> Self {
        Self {
            user_id: request.user_id,
            name: request.name,
            species: request.species,
            date_of_planting: request.date_of_planting,
            comment: request.comment,
            image: request.image,
        }
    }
}

pub async fn list_plants(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.plants.list(&query.options()).await?;
    Ok(Json(page))
}

pub async fn get_plant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, INVALID_ID)?;
    let plant = state.plants.find(id).await?;
    Ok(Json(plant))
}

pub async fn list_plants_by_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .plants
        .list_by_user(&user_id, &query.options())
        .await?;
    Ok(Json(page))
}

pub async fn create_plant(
    State(state): State<ApiState>,
    payload: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = multipart::collect(&state.scratch, payload).await?;
    let scratch_path = form.file.as_ref().map(|file| file.path.clone());

    let command = CreatePlantCommand {
        user_id: form.take("user_id"),
        name: form.take("name"),
        species: form.take("species"),
        date_of_planting: form.take("dateOfPlanting"),
        comment: form.take("comment"),
        image: form.file.take(),
    };
    let result = state.plants.create(command).await;

    if let Some(path) = scratch_path {
        state.scratch.discard_quietly(&path).await;
    }

    let plant = result?;
    Ok((StatusCode::CREATED, Json(plant)))
}

pub async fn update_plant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePlantRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, INVALID_ID)?;
    let Json(request) = payload?;
    let plant = state.plants.update(id, request.into()).await?;
    Ok(Json(plant))
}

pub async fn delete_plant(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, INVALID_ID)?;
    let deleted = state.plants.delete(id).await?;
    Ok(Json(deleted))
}

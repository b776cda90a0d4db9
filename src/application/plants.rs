//! Plant use cases: cached reads plus create/update/delete.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::pagination::{ListOptions, Paginated};
use crate::application::repos::{
    CreatePlantParams, PlantFilter, PlantsRepo, PlantsWriteRepo, UpdatePlantParams,
};
use crate::application::upstream::{ImageFile, ImageUploader};
use crate::cache::{CacheKey, ReadThrough};
use crate::domain::dates::parse_date_input;
use crate::domain::entities::PlantRecord;

/// Raw create-plant input as received from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct CreatePlantCommand {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub species: Option<String>,
    pub date_of_planting: Option<String>,
    pub comment: Option<String>,
    pub image: Option<ImageFile>,
}

/// Partial plant update; only provided fields are changed.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlantCommand {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub species: Option<String>,
    pub date_of_planting: Option<String>,
    pub comment: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct PlantService {
    reader: Arc<dyn PlantsRepo>,
    writer: Arc<dyn PlantsWriteRepo>,
    cache: ReadThrough,
    uploader: Arc<dyn ImageUploader>,
}

impl PlantService {
    pub fn new(
        reader: Arc<dyn PlantsRepo>,
        writer: Arc<dyn PlantsWriteRepo>,
        cache: ReadThrough,
        uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            uploader,
        }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Paginated<PlantRecord>, AppError> {
        let key = CacheKey::PlantList(options.clone());
        self.cache
            .fetch(&key, move || async move {
                self.reader
                    .list_plants(&PlantFilter::All, options)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn list_by_user(
        &self,
        user_id: &str,
        options: &ListOptions,
    ) -> Result<Paginated<PlantRecord>, AppError> {
        let user_id = required_path("user_id", user_id)?;
        let key = CacheKey::PlantsByUser {
            user_id: user_id.clone(),
            options: options.clone(),
        };
        let filter = PlantFilter::ByUser(user_id);
        self.cache
            .fetch(&key, move || async move {
                self.reader
                    .list_plants(&filter, options)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<PlantRecord, AppError> {
        self.cache
            .fetch_optional(&CacheKey::Plant(id), move || async move {
                self.reader.find_plant(id).await.map_err(AppError::from)
            })
            .await?
            .ok_or_else(|| AppError::not_found("plant"))
    }

    pub async fn create(&self, command: CreatePlantCommand) -> Result<PlantRecord, AppError> {
        let CreatePlantCommand {
            user_id,
            name,
            species,
            date_of_planting,
            comment,
            image,
        } = command;

        let image = image.ok_or_else(|| AppError::validation("Image file is required"))?;
        let (Some(user_id), Some(name), Some(species), Some(date_of_planting)) = (
            non_blank(user_id),
            non_blank(name),
            non_blank(species),
            non_blank(date_of_planting),
        ) else {
            return Err(AppError::validation(
                "User ID, name, species, and date of planting are required",
            ));
        };
        let date_of_planting = parse_date_input("dateOfPlanting", &date_of_planting)?;

        let uploaded = self.uploader.upload(&image.path).await?;

        let plant = self
            .writer
            .create_plant(CreatePlantParams {
                user_id,
                name,
                species,
                date_of_planting,
                comment: non_blank(comment),
                image: uploaded.secure_url,
            })
            .await?;

        info!(
            target = "plantlog::application::plants",
            plant_id = %plant.id,
            user_id = %plant.user_id,
            "Plant created"
        );
        Ok(plant)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdatePlantCommand,
    ) -> Result<PlantRecord, AppError> {
        let date_of_planting = provided_non_blank("dateOfPlanting", command.date_of_planting)?
            .map(|raw| parse_date_input("dateOfPlanting", &raw))
            .transpose()?;

        let params = UpdatePlantParams {
            user_id: provided_non_blank("user_id", command.user_id)?,
            name: provided_non_blank("name", command.name)?,
            species: provided_non_blank("species", command.species)?,
            date_of_planting,
            comment: command.comment,
            image: provided_non_blank("image", command.image)?,
        };
        if params.is_empty() {
            return Err(AppError::validation("No updatable plant fields provided"));
        }

        let plant = self
            .writer
            .update_plant(id, params)
            .await?
            .ok_or_else(|| AppError::not_found("plant"))?;

        info!(
            target = "plantlog::application::plants",
            plant_id = %plant.id,
            "Plant updated"
        );
        Ok(plant)
    }

    /// Delete a plant. Its health logs are left in place.
    pub async fn delete(&self, id: Uuid) -> Result<Option<PlantRecord>, AppError> {
        let deleted = self.writer.delete_plant(id).await?;
        info!(
            target = "plantlog::application::plants",
            plant_id = %id,
            deleted = deleted.is_some(),
            "Plant delete processed"
        );
        Ok(deleted)
    }
}

/// Trim a form value; blank strings count as missing.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// An update may omit a mandatory field but may not blank it out. Kept
/// values are trimmed.
pub(crate) fn provided_non_blank(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(raw) => non_blank(Some(raw))
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("`{field}` cannot be blank"))),
    }
}

pub(crate) fn required_path(field: &'static str, value: &str) -> Result<String, AppError> {
    non_blank(Some(value.to_string()))
        .ok_or_else(|| AppError::validation(format!("No {field} provided")))
}

//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{ListOptions, Paginated};
use crate::domain::entities::{HealthLogRecord, PlantRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which plants a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantFilter {
    All,
    ByUser(String),
}

/// Which health logs a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthLogFilter {
    All,
    ByUser(String),
    ByPlant(Uuid),
}

/// Sortable plant attributes, resolved from the wire name of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantSortKey {
    CreatedAt,
    UpdatedAt,
    Name,
    Species,
    DateOfPlanting,
}

impl PlantSortKey {
    /// Unknown names sort by creation time.
    pub fn from_field(field: &str) -> Self {
        match field {
            "updatedAt" => Self::UpdatedAt,
            "name" => Self::Name,
            "species" => Self::Species,
            "dateOfPlanting" => Self::DateOfPlanting,
            _ => Self::CreatedAt,
        }
    }
}

/// Sortable health log attributes, resolved from the wire name of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLogSortKey {
    CreatedAt,
    DateOfDiagnosis,
    Name,
}

impl HealthLogSortKey {
    /// Unknown names sort by creation time.
    pub fn from_field(field: &str) -> Self {
        match field {
            "dateOfDiagnosis" => Self::DateOfDiagnosis,
            "name" => Self::Name,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePlantParams {
    pub user_id: String,
    pub name: String,
    pub species: String,
    pub date_of_planting: OffsetDateTime,
    pub comment: Option<String>,
    pub image: String,
}

/// Partial plant update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlantParams {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub species: Option<String>,
    pub date_of_planting: Option<OffsetDateTime>,
    pub comment: Option<String>,
    pub image: Option<String>,
}

impl UpdatePlantParams {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.name.is_none()
            && self.species.is_none()
            && self.date_of_planting.is_none()
            && self.comment.is_none()
            && self.image.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CreateHealthLogParams {
    pub user_id: String,
    pub plant_id: Uuid,
    pub attachment: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub date_of_diagnosis: OffsetDateTime,
    pub diagnosis_by_model: Option<String>,
}

/// Partial health log update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateHealthLogParams {
    pub user_id: Option<String>,
    pub plant_id: Option<Uuid>,
    pub attachment: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub date_of_diagnosis: Option<OffsetDateTime>,
    pub diagnosis_by_model: Option<String>,
}

impl UpdateHealthLogParams {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.plant_id.is_none()
            && self.attachment.is_none()
            && self.name.is_none()
            && self.comment.is_none()
            && self.date_of_diagnosis.is_none()
            && self.diagnosis_by_model.is_none()
    }
}

#[async_trait]
pub trait PlantsRepo: Send + Sync {
    async fn list_plants(
        &self,
        filter: &PlantFilter,
        options: &ListOptions,
    ) -> Result<Paginated<PlantRecord>, RepoError>;

    async fn count_plants(&self, filter: &PlantFilter) -> Result<u64, RepoError>;

    async fn find_plant(&self, id: Uuid) -> Result<Option<PlantRecord>, RepoError>;
}

#[async_trait]
pub trait PlantsWriteRepo: Send + Sync {
    async fn create_plant(&self, params: CreatePlantParams) -> Result<PlantRecord, RepoError>;

    async fn update_plant(
        &self,
        id: Uuid,
        params: UpdatePlantParams,
    ) -> Result<Option<PlantRecord>, RepoError>;

    async fn delete_plant(&self, id: Uuid) -> Result<Option<PlantRecord>, RepoError>;
}

#[async_trait]
pub trait HealthLogsRepo: Send + Sync {
    async fn list_health_logs(
        &self,
        filter: &HealthLogFilter,
        options: &ListOptions,
    ) -> Result<Paginated<HealthLogRecord>, RepoError>;

    async fn find_health_log(&self, id: Uuid) -> Result<Option<HealthLogRecord>, RepoError>;
}

#[async_trait]
pub trait HealthLogsWriteRepo: Send + Sync {
    async fn create_health_log(
        &self,
        params: CreateHealthLogParams,
    ) -> Result<HealthLogRecord, RepoError>;

    async fn update_health_log(
        &self,
        id: Uuid,
        params: UpdateHealthLogParams,
    ) -> Result<Option<HealthLogRecord>, RepoError>;

    async fn delete_health_log(&self, id: Uuid) -> Result<Option<HealthLogRecord>, RepoError>;
}

/// Liveness probe for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}

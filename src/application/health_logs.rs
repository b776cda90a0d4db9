//! Health log use cases, including AI-assisted diagnosis on creation.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::pagination::{ListOptions, Paginated};
use crate::application::plants::{non_blank, provided_non_blank, required_path};
use crate::application::repos::{
    CreateHealthLogParams, HealthLogFilter, HealthLogsRepo, HealthLogsWriteRepo, PlantsRepo,
    UpdateHealthLogParams,
};
use crate::application::upstream::{ImageFile, ImageUploader, PlantDiagnoser};
use crate::cache::{CacheKey, ReadThrough};
use crate::domain::dates::{iso_millis, parse_date_input};
use crate::domain::entities::{HealthLogRecord, PlantRecord};

/// Raw create-health-log input as received from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct CreateHealthLogCommand {
    pub user_id: Option<String>,
    pub plant_id: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub date_of_diagnosis: Option<String>,
    pub image: Option<ImageFile>,
}

/// Partial health log update; only provided fields are changed.
#[derive(Debug, Clone, Default)]
pub struct UpdateHealthLogCommand {
    pub user_id: Option<String>,
    pub plant_id: Option<String>,
    pub attachment: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub date_of_diagnosis: Option<String>,
    pub diagnosis_by_model: Option<String>,
}

#[derive(Clone)]
pub struct HealthLogService {
    reader: Arc<dyn HealthLogsRepo>,
    writer: Arc<dyn HealthLogsWriteRepo>,
    plants: Arc<dyn PlantsRepo>,
    cache: ReadThrough,
    uploader: Arc<dyn ImageUploader>,
    diagnoser: Arc<dyn PlantDiagnoser>,
}

impl HealthLogService {
    pub fn new(
        reader: Arc<dyn HealthLogsRepo>,
        writer: Arc<dyn HealthLogsWriteRepo>,
        plants: Arc<dyn PlantsRepo>,
        cache: ReadThrough,
        uploader: Arc<dyn ImageUploader>,
        diagnoser: Arc<dyn PlantDiagnoser>,
    ) -> Self {
        Self {
            reader,
            writer,
            plants,
            cache,
            uploader,
            diagnoser,
        }
    }

    pub async fn list(
        &self,
        options: &ListOptions,
    ) -> Result<Paginated<HealthLogRecord>, AppError> {
        let key = CacheKey::HealthLogList(options.clone());
        self.cache
            .fetch(&key, move || async move {
                self.reader
                    .list_health_logs(&HealthLogFilter::All, options)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    /// Newest-first logs for one user; caller supplied ordering is ignored.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        options: &ListOptions,
    ) -> Result<Paginated<HealthLogRecord>, AppError> {
        let user_id = required_path("user_id", user_id)?;
        let options = options.clone().with_default_sort();
        let key = CacheKey::HealthLogsByUser {
            user_id: user_id.clone(),
            page: options.page,
            limit: options.limit,
        };
        self.list_scoped(key, HealthLogFilter::ByUser(user_id), options)
            .await
    }

    /// Newest-first logs for one plant; caller supplied ordering is ignored.
    pub async fn list_by_plant(
        &self,
        plant_id: Uuid,
        options: &ListOptions,
    ) -> Result<Paginated<HealthLogRecord>, AppError> {
        let options = options.clone().with_default_sort();
        let key = CacheKey::HealthLogsByPlant {
            plant_id,
            page: options.page,
            limit: options.limit,
        };
        self.list_scoped(key, HealthLogFilter::ByPlant(plant_id), options)
            .await
    }

    async fn list_scoped(
        &self,
        key: CacheKey,
        filter: HealthLogFilter,
        options: ListOptions,
    ) -> Result<Paginated<HealthLogRecord>, AppError> {
        self.cache
            .fetch(&key, move || async move {
                self.reader
                    .list_health_logs(&filter, &options)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<HealthLogRecord, AppError> {
        self.cache
            .fetch_optional(&CacheKey::HealthLog(id), move || async move {
                self.reader.find_health_log(id).await.map_err(AppError::from)
            })
            .await?
            .ok_or_else(|| AppError::not_found("health log"))
    }

    /// Create a log: diagnose the image against the plant's history, upload
    /// it, then persist the record with both results.
    pub async fn create(
        &self,
        command: CreateHealthLogCommand,
    ) -> Result<HealthLogRecord, AppError> {
        let CreateHealthLogCommand {
            user_id,
            plant_id,
            name,
            comment,
            date_of_diagnosis,
            image,
        } = command;

        let image = image.ok_or_else(|| AppError::validation("File is required"))?;
        let (Some(user_id), Some(plant_id), Some(date_of_diagnosis)) = (
            non_blank(user_id),
            non_blank(plant_id),
            non_blank(date_of_diagnosis),
        ) else {
            return Err(AppError::validation(
                "User ID, Plant ID, and date of diagnosis are required",
            ));
        };
        let plant_id = parse_plant_id(&plant_id)?;
        let date_of_diagnosis = parse_date_input("dateOfDiagnosis", &date_of_diagnosis)?;
        let comment = non_blank(comment);

        let plant = self
            .plants
            .find_plant(plant_id)
            .await?
            .ok_or_else(|| AppError::not_found("plant"))?;

        let context = diagnosis_context(&plant, comment.as_deref());
        debug!(
            target = "plantlog::application::health_logs",
            plant_id = %plant.id,
            context = %context,
            "Requesting diagnosis"
        );
        let diagnosis = self.diagnoser.diagnose(&context, &image).await?;
        let uploaded = self.uploader.upload(&image.path).await?;

        let log = self
            .writer
            .create_health_log(CreateHealthLogParams {
                user_id,
                plant_id,
                attachment: Some(uploaded.secure_url),
                name: non_blank(name),
                comment,
                date_of_diagnosis,
                diagnosis_by_model: Some(diagnosis),
            })
            .await?;

        info!(
            target = "plantlog::application::health_logs",
            health_log_id = %log.id,
            plant_id = %log.plant_id,
            "Health log created"
        );
        Ok(log)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateHealthLogCommand,
    ) -> Result<HealthLogRecord, AppError> {
        let plant_id = provided_non_blank("plant_id", command.plant_id)?
            .as_deref()
            .map(parse_plant_id)
            .transpose()?;
        let date_of_diagnosis =
            provided_non_blank("dateOfDiagnosis", command.date_of_diagnosis)?
                .map(|raw| parse_date_input("dateOfDiagnosis", &raw))
                .transpose()?;

        let params = UpdateHealthLogParams {
            user_id: provided_non_blank("user_id", command.user_id)?,
            plant_id,
            attachment: command.attachment,
            name: command.name,
            comment: command.comment,
            date_of_diagnosis,
            diagnosis_by_model: command.diagnosis_by_model,
        };
        if params.is_empty() {
            return Err(AppError::validation(
                "No updatable health log fields provided",
            ));
        }

        let log = self
            .writer
            .update_health_log(id, params)
            .await?
            .ok_or_else(|| AppError::not_found("health log"))?;

        info!(
            target = "plantlog::application::health_logs",
            health_log_id = %log.id,
            "Health log updated"
        );
        Ok(log)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<HealthLogRecord>, AppError> {
        let deleted = self.writer.delete_health_log(id).await?;
        info!(
            target = "plantlog::application::health_logs",
            health_log_id = %id,
            deleted = deleted.is_some(),
            "Health log delete processed"
        );
        Ok(deleted)
    }
}

fn parse_plant_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::validation(format!("`plant_id` is not a valid id: {raw}")))
}

/// Supporting notes sent alongside the image: the planting date followed by
/// the plant's comment and the new log's comment. Absent comments render empty.
pub fn diagnosis_context(plant: &PlantRecord, log_comment: Option<&str>) -> String {
    format!(
        "dateofPlanting{}{}{}",
        iso_millis(plant.date_of_planting),
        plant.comment.as_deref().unwrap_or_default(),
        log_comment.unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use time::OffsetDateTime;
    use time::macros::datetime;

    use super::*;
    use crate::application::repos::{PlantFilter, RepoError};
    use crate::application::upstream::{UploadedImage, UpstreamError};
    use crate::cache::{CacheConfig, MemoryCache};

    #[derive(Default)]
    struct Store {
        plants: Vec<PlantRecord>,
        logs: Mutex<Vec<HealthLogRecord>>,
        list_options: Mutex<Vec<(HealthLogFilter, ListOptions)>>,
    }

    #[async_trait]
    impl PlantsRepo for Store {
        async fn list_plants(
            &self,
            _filter: &PlantFilter,
            options: &ListOptions,
        ) -> Result<Paginated<PlantRecord>, RepoError> {
            Ok(Paginated::new(
                self.plants.clone(),
                self.plants.len() as u64,
                options,
            ))
        }

        async fn count_plants(&self, _filter: &PlantFilter) -> Result<u64, RepoError> {
            Ok(self.plants.len() as u64)
        }

        async fn find_plant(&self, id: Uuid) -> Result<Option<PlantRecord>, RepoError> {
            Ok(self.plants.iter().find(|plant| plant.id == id).cloned())
        }
    }

    #[async_trait]
    impl HealthLogsRepo for Store {
        async fn list_health_logs(
            &self,
            filter: &HealthLogFilter,
            options: &ListOptions,
        ) -> Result<Paginated<HealthLogRecord>, RepoError> {
            self.list_options
                .lock()
                .unwrap()
                .push((filter.clone(), options.clone()));
            Ok(Paginated::new(Vec::new(), 0, options))
        }

        async fn find_health_log(&self, id: Uuid) -> Result<Option<HealthLogRecord>, RepoError> {
            Ok(self
                .logs
                .lock()
                .unwrap()
                .iter()
                .find(|log| log.id == id)
                .cloned())
        }
    }

    #[async_trait]
    impl HealthLogsWriteRepo for Store {
        async fn create_health_log(
            &self,
            params: CreateHealthLogParams,
        ) -> Result<HealthLogRecord, RepoError> {
            let log = HealthLogRecord {
                id: Uuid::new_v4(),
                user_id: params.user_id,
                plant_id: params.plant_id,
                attachment: params.attachment,
                name: params.name,
                comment: params.comment,
                date_of_diagnosis: params.date_of_diagnosis,
                diagnosis_by_model: params.diagnosis_by_model,
                created_at: OffsetDateTime::now_utc(),
            };
            self.logs.lock().unwrap().push(log.clone());
            Ok(log)
        }

        async fn update_health_log(
            &self,
            _id: Uuid,
            _params: UpdateHealthLogParams,
        ) -> Result<Option<HealthLogRecord>, RepoError> {
            Ok(None)
        }

        async fn delete_health_log(
            &self,
            id: Uuid,
        ) -> Result<Option<HealthLogRecord>, RepoError> {
            let mut logs = self.logs.lock().unwrap();
            let index = logs.iter().position(|log| log.id == id);
            Ok(index.map(|index| logs.remove(index)))
        }
    }

    #[derive(Default)]
    struct Upstream {
        contexts: Mutex<Vec<(String, String)>>,
        uploads: Mutex<Vec<PathBuf>>,
        fail_diagnosis: bool,
    }

    #[async_trait]
    impl ImageUploader for Upstream {
        async fn upload(&self, local_path: &Path) -> Result<UploadedImage, UpstreamError> {
            self.uploads.lock().unwrap().push(local_path.to_path_buf());
            Ok(UploadedImage {
                secure_url: "https://img.example/log.png".to_string(),
            })
        }
    }

    #[async_trait]
    impl PlantDiagnoser for Upstream {
        async fn diagnose(&self, context: &str, image: &ImageFile) -> Result<String, UpstreamError> {
            if self.fail_diagnosis {
                return Err(UpstreamError::diagnosis("quota exceeded"));
            }
            self.contexts
                .lock()
                .unwrap()
                .push((context.to_string(), image.content_type.clone()));
            Ok("Leaves show mild overwatering.".to_string())
        }
    }

    fn plant() -> PlantRecord {
        PlantRecord {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            name: "Fern".to_string(),
            species: "Nephrolepis".to_string(),
            date_of_planting: datetime!(2024-03-01 00:00 UTC),
            comment: Some("north window".to_string()),
            image: "https://img.example/fern.png".to_string(),
            created_at: datetime!(2024-03-02 00:00 UTC),
            updated_at: datetime!(2024-03-02 00:00 UTC),
        }
    }

    fn service_with(
        plants: Vec<PlantRecord>,
        fail_diagnosis: bool,
    ) -> (HealthLogService, Arc<Store>, Arc<Upstream>) {
        let store = Arc::new(Store {
            plants,
            ..Default::default()
        });
        let upstream = Arc::new(Upstream {
            fail_diagnosis,
            ..Default::default()
        });
        let cache = ReadThrough::new(Arc::new(MemoryCache::new(&CacheConfig::default())));
        let service = HealthLogService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            cache,
            upstream.clone(),
            upstream.clone(),
        );
        (service, store, upstream)
    }

    fn command(plant_id: Uuid) -> CreateHealthLogCommand {
        CreateHealthLogCommand {
            user_id: Some("user-1".to_string()),
            plant_id: Some(plant_id.to_string()),
            name: Some("Weekly check".to_string()),
            comment: Some("yellow tips".to_string()),
            date_of_diagnosis: Some("2024-05-10T08:00:00Z".to_string()),
            image: Some(ImageFile {
                path: PathBuf::from("uploads/tmp/leaf.jpg"),
                content_type: "image/jpeg".to_string(),
                bytes: Bytes::from_static(b"jpeg"),
            }),
        }
    }

    #[test]
    fn context_joins_planting_date_and_comments() {
        let plant = plant();
        assert_eq!(
            diagnosis_context(&plant, Some("yellow tips")),
            "dateofPlanting2024-03-01T00:00:00.000Znorth windowyellow tips"
        );
        let bare = PlantRecord {
            comment: None,
            ..plant
        };
        assert_eq!(
            diagnosis_context(&bare, None),
            "dateofPlanting2024-03-01T00:00:00.000Z"
        );
    }

    #[tokio::test]
    async fn create_records_diagnosis_and_attachment() {
        let plant = plant();
        let (service, _, upstream) = service_with(vec![plant.clone()], false);

        let log = service.create(command(plant.id)).await.unwrap();

        assert_eq!(log.plant_id, plant.id);
        assert_eq!(
            log.attachment.as_deref(),
            Some("https://img.example/log.png")
        );
        assert_eq!(
            log.diagnosis_by_model.as_deref(),
            Some("Leaves show mild overwatering.")
        );
        let contexts = upstream.contexts.lock().unwrap();
        assert_eq!(
            contexts.as_slice(),
            &[(
                "dateofPlanting2024-03-01T00:00:00.000Znorth windowyellow tips".to_string(),
                "image/jpeg".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn create_for_unknown_plant_is_not_found() {
        let (service, store, upstream) = service_with(Vec::new(), false);

        let err = service.create(command(Uuid::new_v4())).await.unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
        assert!(store.logs.lock().unwrap().is_empty());
        assert!(upstream.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_requires_file_then_fields() {
        let plant = plant();
        let (service, _, _) = service_with(vec![plant.clone()], false);

        let err = service
            .create(CreateHealthLogCommand {
                image: None,
                date_of_diagnosis: None,
                ..command(plant.id)
            })
            .await
            .unwrap_err();
        assert_eq!(err.detail().as_deref(), Some("File is required"));

        let err = service
            .create(CreateHealthLogCommand {
                date_of_diagnosis: None,
                ..command(plant.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .create(CreateHealthLogCommand {
                plant_id: Some("not-an-id".to_string()),
                ..command(plant.id)
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn diagnosis_failure_skips_upload() {
        let plant = plant();
        let (service, store, upstream) = service_with(vec![plant.clone()], true);

        let err = service.create(command(plant.id)).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(UpstreamError::Diagnosis(_))));
        assert!(upstream.uploads.lock().unwrap().is_empty());
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scoped_listings_force_newest_first() {
        let (service, store, _) = service_with(Vec::new(), false);
        let options = ListOptions::from_query(Some("2"), Some("5"), Some("name"), Some("asc"));
        let plant_id = Uuid::new_v4();

        service.list_by_user("user-1", &options).await.unwrap();
        service.list_by_plant(plant_id, &options).await.unwrap();

        let seen = store.list_options.lock().unwrap();
        let expected = ListOptions::from_query(Some("2"), Some("5"), None, None);
        assert_eq!(
            seen.as_slice(),
            &[
                (HealthLogFilter::ByUser("user-1".to_string()), expected.clone()),
                (HealthLogFilter::ByPlant(plant_id), expected),
            ]
        );
    }

    #[tokio::test]
    async fn blank_mandatory_update_fields_are_rejected() {
        let (service, _, _) = service_with(Vec::new(), false);
        for update in [
            UpdateHealthLogCommand {
                user_id: Some(" ".to_string()),
                ..Default::default()
            },
            UpdateHealthLogCommand {
                plant_id: Some(String::new()),
                ..Default::default()
            },
            UpdateHealthLogCommand {
                date_of_diagnosis: Some("  ".to_string()),
                ..Default::default()
            },
        ] {
            let err = service.update(Uuid::new_v4(), update).await.unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn update_of_missing_log_is_not_found() {
        let (service, _, _) = service_with(Vec::new(), false);
        let err = service
            .update(
                Uuid::new_v4(),
                UpdateHealthLogCommand {
                    comment: Some("recovered".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}

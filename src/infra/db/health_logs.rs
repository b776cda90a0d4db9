use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListOptions, Paginated},
    application::repos::{
        CreateHealthLogParams, HealthLogFilter, HealthLogSortKey, HealthLogsRepo,
        HealthLogsWriteRepo, RepoError, UpdateHealthLogParams,
    },
    domain::entities::HealthLogRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const HEALTH_LOG_COLUMNS: &str = "id, user_id, plant_id, attachment, name, comment, \
     date_of_diagnosis, diagnosis_by_model, created_at";

#[derive(sqlx::FromRow)]
struct HealthLogRow {
    id: Uuid,
    user_id: String,
    plant_id: Uuid,
    attachment: Option<String>,
    name: Option<String>,
    comment: Option<String>,
    date_of_diagnosis: OffsetDateTime,
    diagnosis_by_model: Option<String>,
    created_at: OffsetDateTime,
}

impl From<HealthLogRow> for HealthLogRecord {
    fn from(row: HealthLogRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            plant_id: row.plant_id,
            attachment: row.attachment,
            name: row.name,
            comment: row.comment,
            date_of_diagnosis: row.date_of_diagnosis,
            diagnosis_by_model: row.diagnosis_by_model,
            created_at: row.created_at,
        }
    }
}

fn sort_column(key: HealthLogSortKey) -> &'static str {
    match key {
        HealthLogSortKey::CreatedAt => "created_at",
        HealthLogSortKey::DateOfDiagnosis => "date_of_diagnosis",
        HealthLogSortKey::Name => "name",
    }
}

fn push_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q HealthLogFilter) {
    match filter {
        HealthLogFilter::All => {}
        HealthLogFilter::ByUser(user_id) => {
            qb.push(" WHERE user_id = ");
            qb.push_bind(user_id.as_str());
        }
        HealthLogFilter::ByPlant(plant_id) => {
            qb.push(" WHERE plant_id = ");
            qb.push_bind(*plant_id);
        }
    }
}

fn list_query<'q>(
    filter: &'q HealthLogFilter,
    options: &ListOptions,
) -> Result<QueryBuilder<'q, Postgres>, RepoError> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(HEALTH_LOG_COLUMNS);
    qb.push(" FROM health_logs");
    push_filter(&mut qb, filter);
    PostgresRepositories::push_page_clause(
        &mut qb,
        sort_column(HealthLogSortKey::from_field(&options.sort_field)),
        options.sort_order,
        options.limit,
        options.offset(),
    )?;
    Ok(qb)
}

fn count_query(filter: &HealthLogFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM health_logs");
    push_filter(&mut qb, filter);
    qb
}

impl PostgresRepositories {
    async fn count_health_logs(&self, filter: &HealthLogFilter) -> Result<u64, RepoError> {
        let mut qb = count_query(filter);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}

#[async_trait]
impl HealthLogsRepo for PostgresRepositories {
    async fn list_health_logs(
        &self,
        filter: &HealthLogFilter,
        options: &ListOptions,
    ) -> Result<Paginated<HealthLogRecord>, RepoError> {
        let mut qb = list_query(filter, options)?;
        let rows = async {
            qb.build_query_as::<HealthLogRow>()
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)
        };

        let (rows, total) = tokio::try_join!(rows, self.count_health_logs(filter))?;
        let data = rows.into_iter().map(HealthLogRecord::from).collect();
        Ok(Paginated::new(data, total, options))
    }

    async fn find_health_log(&self, id: Uuid) -> Result<Option<HealthLogRecord>, RepoError> {
        let row = sqlx::query_as::<_, HealthLogRow>(&format!(
            "SELECT {HEALTH_LOG_COLUMNS} FROM health_logs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(HealthLogRecord::from))
    }
}

#[async_trait]
impl HealthLogsWriteRepo for PostgresRepositories {
    async fn create_health_log(
        &self,
        params: CreateHealthLogParams,
    ) -> Result<HealthLogRecord, RepoError> {
        let row = sqlx::query_as::<_, HealthLogRow>(&format!(
            "INSERT INTO health_logs \
                 (id, user_id, plant_id, attachment, name, comment, date_of_diagnosis, diagnosis_by_model) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {HEALTH_LOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(params.plant_id)
        .bind(params.attachment)
        .bind(params.name)
        .bind(params.comment)
        .bind(params.date_of_diagnosis)
        .bind(params.diagnosis_by_model)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(HealthLogRecord::from(row))
    }

    async fn update_health_log(
        &self,
        id: Uuid,
        params: UpdateHealthLogParams,
    ) -> Result<Option<HealthLogRecord>, RepoError> {
        let row = sqlx::query_as::<_, HealthLogRow>(&format!(
            "UPDATE health_logs SET \
                 user_id = COALESCE($2, user_id), \
                 plant_id = COALESCE($3, plant_id), \
                 attachment = COALESCE($4, attachment), \
                 name = COALESCE($5, name), \
                 comment = COALESCE($6, comment), \
                 date_of_diagnosis = COALESCE($7, date_of_diagnosis), \
                 diagnosis_by_model = COALESCE($8, diagnosis_by_model) \
             WHERE id = $1 \
             RETURNING {HEALTH_LOG_COLUMNS}"
        ))
        .bind(id)
        .bind(params.user_id)
        .bind(params.plant_id)
        .bind(params.attachment)
        .bind(params.name)
        .bind(params.comment)
        .bind(params.date_of_diagnosis)
        .bind(params.diagnosis_by_model)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(HealthLogRecord::from))
    }

    async fn delete_health_log(&self, id: Uuid) -> Result<Option<HealthLogRecord>, RepoError> {
        let row = sqlx::query_as::<_, HealthLogRow>(&format!(
            "DELETE FROM health_logs WHERE id = $1 RETURNING {HEALTH_LOG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(HealthLogRecord::from))
    }
}

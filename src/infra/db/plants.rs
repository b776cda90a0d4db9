use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{ListOptions, Paginated},
    application::repos::{
        CreatePlantParams, PlantFilter, PlantSortKey, PlantsRepo, PlantsWriteRepo, RepoError,
        UpdatePlantParams,
    },
    domain::entities::PlantRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const PLANT_COLUMNS: &str =
    "id, user_id, name, species, date_of_planting, comment, image, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PlantRow {
    id: Uuid,
    user_id: String,
    name: String,
    species: String,
    date_of_planting: OffsetDateTime,
    comment: Option<String>,
    image: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PlantRow> for PlantRecord {
    fn from(row: PlantRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            species: row.species,
            date_of_planting: row.date_of_planting,
            comment: row.comment,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn sort_column(key: PlantSortKey) -> &'static str {
    match key {
        PlantSortKey::CreatedAt => "created_at",
        PlantSortKey::UpdatedAt => "updated_at",
        PlantSortKey::Name => "name",
        PlantSortKey::Species => "species",
        PlantSortKey::DateOfPlanting => "date_of_planting",
    }
}

fn push_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q PlantFilter) {
    match filter {
        PlantFilter::All => {}
        PlantFilter::ByUser(user_id) => {
            qb.push(" WHERE user_id = ");
            qb.push_bind(user_id.as_str());
        }
    }
}

fn list_query<'q>(
    filter: &'q PlantFilter,
    options: &ListOptions,
) -> Result<QueryBuilder<'q, Postgres>, RepoError> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(PLANT_COLUMNS);
    qb.push(" FROM plants");
    push_filter(&mut qb, filter);
    PostgresRepositories::push_page_clause(
        &mut qb,
        sort_column(PlantSortKey::from_field(&options.sort_field)),
        options.sort_order,
        options.limit,
        options.offset(),
    )?;
    Ok(qb)
}

fn count_query(filter: &PlantFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM plants");
    push_filter(&mut qb, filter);
    qb
}

#[async_trait]
impl PlantsRepo for PostgresRepositories {
    async fn list_plants(
        &self,
        filter: &PlantFilter,
        options: &ListOptions,
    ) -> Result<Paginated<PlantRecord>, RepoError> {
        let mut qb = list_query(filter, options)?;
        let rows = async {
            qb.build_query_as::<PlantRow>()
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)
        };

        let (rows, total) = tokio::try_join!(rows, self.count_plants(filter))?;
        let data = rows.into_iter().map(PlantRecord::from).collect();
        Ok(Paginated::new(data, total, options))
    }

    async fn count_plants(&self, filter: &PlantFilter) -> Result<u64, RepoError> {
        let mut qb = count_query(filter);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn find_plant(&self, id: Uuid) -> Result<Option<PlantRecord>, RepoError> {
        let row = sqlx::query_as::<_, PlantRow>(&format!(
            "SELECT {PLANT_COLUMNS} FROM plants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PlantRecord::from))
    }
}

#[async_trait]
impl PlantsWriteRepo for PostgresRepositories {
    async fn create_plant(&self, params: CreatePlantParams) -> Result<PlantRecord, RepoError> {
        let row = sqlx::query_as::<_, PlantRow>(&format!(
            "INSERT INTO plants (id, user_id, name, species, date_of_planting, comment, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PLANT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(params.name)
        .bind(params.species)
        .bind(params.date_of_planting)
        .bind(params.comment)
        .bind(params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PlantRecord::from(row))
    }

    async fn update_plant(
        &self,
        id: Uuid,
        params: UpdatePlantParams,
    ) -> Result<Option<PlantRecord>, RepoError> {
        let row = sqlx::query_as::<_, PlantRow>(&format!(
            "UPDATE plants SET \
                 user_id = COALESCE($2, user_id), \
                 name = COALESCE($3, name), \
                 species = COALESCE($4, species), \
                 date_of_planting = COALESCE($5, date_of_planting), \
                 comment = COALESCE($6, comment), \
                 image = COALESCE($7, image), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {PLANT_COLUMNS}"
        ))
        .bind(id)
        .bind(params.user_id)
        .bind(params.name)
        .bind(params.species)
        .bind(params.date_of_planting)
        .bind(params.comment)
        .bind(params.image)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PlantRecord::from))
    }

    async fn delete_plant(&self, id: Uuid) -> Result<Option<PlantRecord>, RepoError> {
        let row = sqlx::query_as::<_, PlantRow>(&format!(
            "DELETE FROM plants WHERE id = $1 RETURNING {PLANT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PlantRecord::from))
    }
}

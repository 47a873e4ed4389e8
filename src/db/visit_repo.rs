//! Visit repository implementation for vetclinic

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Row};

use crate::{
    db::{
        repository::{
            execute_with_retry, id_strings, stored_id, Repository, RepositoryError,
            RepositoryResult, RetryConfig, VisitRepository,
        },
        DbPool,
    },
    models::{ObjectId, Ref, Visit, VisitPatch},
};

/// PostgreSQL implementation of VisitRepository
pub struct PgVisitRepository {
    pool: DbPool,
    retry_config: RetryConfig,
}

impl PgVisitRepository {
    /// Create a new PostgreSQL visit repository
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create with custom retry configuration
    pub fn with_retry_config(pool: DbPool, retry_config: RetryConfig) -> Self {
        Self { pool, retry_config }
    }

    fn row_to_visit(row: &PgRow) -> RepositoryResult<Visit> {
        let id: String = row.try_get("id")?;
        let pet_id: String = row.try_get("pet_id")?;
        let veterinarian_id: Option<String> = row.try_get("veterinarian_id")?;

        Ok(Visit {
            id: stored_id(&id)?,
            date: row.try_get("date")?,
            description: row.try_get("description")?,
            pet: Ref::Unresolved(stored_id(&pet_id)?),
            veterinarian: veterinarian_id
                .as_deref()
                .map(stored_id)
                .transpose()?
                .map(Ref::Unresolved),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Repository for PgVisitRepository {
    type Entity = Visit;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Visit>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    SELECT id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    FROM visits
                    WHERE id = $1
                    "#,
                )
                .bind(id.to_hex())
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_visit).transpose()
            })
        })
        .await
    }

    async fn exists(&self, id: ObjectId) -> RepositoryResult<bool> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM visits WHERE id = $1)",
                )
                .bind(id.to_hex())
                .fetch_one(&pool)
                .await?;

                Ok(result)
            })
        })
        .await
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<bool> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result = sqlx::query("DELETE FROM visits WHERE id = $1")
                    .bind(id.to_hex())
                    .execute(&pool)
                    .await?;

                Ok(result.rows_affected() > 0)
            })
        })
        .await
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits")
                    .fetch_one(&pool)
                    .await?;

                Ok(count)
            })
        })
        .await
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM visits").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1 FROM visits LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::Connection(format!("Health check failed: {}", e)))
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Visit>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    FROM visits
                    ORDER BY date DESC, id DESC
                    "#,
                )
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_visit).collect()
            })
        })
        .await
    }

    async fn find_by_pet(&self, pet: ObjectId) -> RepositoryResult<Vec<Visit>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    FROM visits
                    WHERE pet_id = $1
                    ORDER BY date DESC, id DESC
                    "#,
                )
                .bind(pet.to_hex())
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_visit).collect()
            })
        })
        .await
    }

    async fn find_by_pets(&self, pets: &[ObjectId]) -> RepositoryResult<Vec<Visit>> {
        if pets.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool.clone();
        let pets = id_strings(pets);

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let pets = pets.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    FROM visits
                    WHERE pet_id = ANY($1)
                    ORDER BY date DESC, id DESC
                    "#,
                )
                .bind(pets)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_visit).collect()
            })
        })
        .await
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Visit>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    FROM visits
                    WHERE date >= $1 AND date < $2
                    ORDER BY date DESC, id DESC
                    "#,
                )
                .bind(start)
                .bind(end)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_visit).collect()
            })
        })
        .await
    }

    async fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<Visit>> {
        let pool = self.pool.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    FROM visits
                    ORDER BY date DESC, id DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_visit).collect()
            })
        })
        .await
    }

    async fn insert(&self, visit: &Visit) -> RepositoryResult<()> {
        let pool = self.pool.clone();
        let visit = visit.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let visit = visit.clone();
            Box::pin(async move {
                sqlx::query(
                    r#"
                    INSERT INTO visits (
                        id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(visit.id.to_hex())
                .bind(visit.date)
                .bind(&visit.description)
                .bind(visit.pet_id().to_hex())
                .bind(visit.veterinarian_id().map(|v| v.to_hex()))
                .bind(visit.created_at)
                .bind(visit.updated_at)
                .execute(&pool)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn update(&self, id: ObjectId, patch: &VisitPatch) -> RepositoryResult<Option<Visit>> {
        let pool = self.pool.clone();
        let patch = patch.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let patch = patch.clone();
            Box::pin(async move {
                let (replace_veterinarian, veterinarian) = match patch.veterinarian {
                    Some(value) => (true, value.map(|v| v.to_hex())),
                    None => (false, None),
                };

                let result = sqlx::query(
                    r#"
                    UPDATE visits SET
                        date = COALESCE($2, date),
                        description = COALESCE($3, description),
                        pet_id = COALESCE($4, pet_id),
                        veterinarian_id = CASE WHEN $5 THEN $6 ELSE veterinarian_id END,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, date, description, pet_id, veterinarian_id, created_at, updated_at
                    "#,
                )
                .bind(id.to_hex())
                .bind(patch.date)
                .bind(patch.description)
                .bind(patch.pet.map(|p| p.to_hex()))
                .bind(replace_veterinarian)
                .bind(veterinarian)
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_visit).transpose()
            })
        })
        .await
    }
}

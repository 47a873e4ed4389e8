//! Veterinarian repository implementation for vetclinic

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};

use crate::{
    db::{
        repository::{
            execute_with_retry, id_strings, stored_id, Repository, RepositoryError,
            RepositoryResult, RetryConfig, VeterinarianRepository,
        },
        DbPool,
    },
    models::{ObjectId, Veterinarian, VeterinarianPatch},
};

/// PostgreSQL implementation of VeterinarianRepository
pub struct PgVeterinarianRepository {
    pool: DbPool,
    retry_config: RetryConfig,
}

impl PgVeterinarianRepository {
    /// Create a new PostgreSQL veterinarian repository
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

    fn row_to_veterinarian(row: &PgRow) -> RepositoryResult<Veterinarian> {
        let id: String = row.try_get("id")?;

        Ok(Veterinarian {
            id: stored_id(&id)?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            specialties: row.try_get("specialties")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Repository for PgVeterinarianRepository {
    type Entity = Veterinarian;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Veterinarian>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    SELECT id, first_name, last_name, specialties, created_at, updated_at
                    FROM veterinarians
                    WHERE id = $1
                    "#,
                )
                .bind(id.to_hex())
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_veterinarian).transpose()
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
                    "SELECT EXISTS(SELECT 1 FROM veterinarians WHERE id = $1)",
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
                let result = sqlx::query("DELETE FROM veterinarians WHERE id = $1")
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
                let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM veterinarians")
                    .fetch_one(&pool)
                    .await?;

                Ok(count)
            })
        })
        .await
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM veterinarians").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1 FROM veterinarians LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::Connection(format!("Health check failed: {}", e)))
    }
}

#[async_trait]
impl VeterinarianRepository for PgVeterinarianRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Veterinarian>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, first_name, last_name, specialties, created_at, updated_at
                    FROM veterinarians
                    ORDER BY last_name COLLATE "C", first_name COLLATE "C", id
                    "#,
                )
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_veterinarian).collect()
            })
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Veterinarian>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool.clone();
        let ids = id_strings(ids);

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let ids = ids.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, first_name, last_name, specialties, created_at, updated_at
                    FROM veterinarians
                    WHERE id = ANY($1)
                    "#,
                )
                .bind(ids)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_veterinarian).collect()
            })
        })
        .await
    }

    async fn insert(&self, veterinarian: &Veterinarian) -> RepositoryResult<()> {
        let pool = self.pool.clone();
        let vet = veterinarian.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let vet = vet.clone();
            Box::pin(async move {
                sqlx::query(
                    r#"
                    INSERT INTO veterinarians (
                        id, first_name, last_name, specialties, created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(vet.id.to_hex())
                .bind(&vet.first_name)
                .bind(&vet.last_name)
                .bind(&vet.specialties)
                .bind(vet.created_at)
                .bind(vet.updated_at)
                .execute(&pool)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn update(
        &self,
        id: ObjectId,
        patch: &VeterinarianPatch,
    ) -> RepositoryResult<Option<Veterinarian>> {
        let pool = self.pool.clone();
        let patch = patch.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let patch = patch.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE veterinarians SET
                        first_name = COALESCE($2, first_name),
                        last_name = COALESCE($3, last_name),
                        specialties = COALESCE($4, specialties),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, first_name, last_name, specialties, created_at, updated_at
                    "#,
                )
                .bind(id.to_hex())
                .bind(patch.first_name)
                .bind(patch.last_name)
                .bind(patch.specialties)
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_veterinarian).transpose()
            })
        })
        .await
    }
}

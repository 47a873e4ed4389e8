//! Owner repository implementation for vetclinic
//!
//! PostgreSQL storage for owners, including the owner → pets → visits
//! cascade performed inside a single transaction.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use tracing::Instrument;

use crate::{
    db::{
        repository::{
            execute_with_retry, id_strings, stored_id, CascadeReport, OwnerRepository,
            Repository, RepositoryError, RepositoryResult, RetryConfig,
        },
        DbPool,
    },
    db_span,
    models::{validation::escape_like, ObjectId, Owner, OwnerPatch},
};

/// PostgreSQL implementation of OwnerRepository
pub struct PgOwnerRepository {
    pool: DbPool,
    retry_config: RetryConfig,
}

impl PgOwnerRepository {
    /// Create a new PostgreSQL owner repository
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

    /// Convert a database row to Owner
    fn row_to_owner(row: &PgRow) -> RepositoryResult<Owner> {
        let id: String = row.try_get("id")?;

        Ok(Owner {
            id: stored_id(&id)?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            telephone: row.try_get("telephone")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Repository for PgOwnerRepository {
    type Entity = Owner;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Owner>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    SELECT id, first_name, last_name, address, city, telephone,
                           created_at, updated_at
                    FROM owners
                    WHERE id = $1
                    "#,
                )
                .bind(id.to_hex())
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_owner).transpose()
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
                    "SELECT EXISTS(SELECT 1 FROM owners WHERE id = $1)",
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
                let result = sqlx::query("DELETE FROM owners WHERE id = $1")
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
                let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM owners")
                    .fetch_one(&pool)
                    .await?;

                Ok(count)
            })
        })
        .await
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM owners").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1 FROM owners LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::Connection(format!("Health check failed: {}", e)))
    }
}

#[async_trait]
impl OwnerRepository for PgOwnerRepository {
    async fn find_all(&self, last_name: Option<&str>) -> RepositoryResult<Vec<Owner>> {
        let pool = self.pool.clone();
        let pattern = last_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let pattern = pattern.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, first_name, last_name, address, city, telephone,
                           created_at, updated_at
                    FROM owners
                    WHERE $1::TEXT IS NULL OR last_name ILIKE $1
                    ORDER BY last_name COLLATE "C", first_name COLLATE "C", id
                    "#,
                )
                .bind(pattern)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_owner).collect()
            })
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Owner>> {
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
                    SELECT id, first_name, last_name, address, city, telephone,
                           created_at, updated_at
                    FROM owners
                    WHERE id = ANY($1)
                    "#,
                )
                .bind(ids)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_owner).collect()
            })
        })
        .await
    }

    async fn insert(&self, owner: &Owner) -> RepositoryResult<()> {
        let pool = self.pool.clone();
        let owner = owner.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let owner = owner.clone();
            Box::pin(async move {
                sqlx::query(
                    r#"
                    INSERT INTO owners (
                        id, first_name, last_name, address, city, telephone,
                        created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(owner.id.to_hex())
                .bind(&owner.first_name)
                .bind(&owner.last_name)
                .bind(&owner.address)
                .bind(&owner.city)
                .bind(&owner.telephone)
                .bind(owner.created_at)
                .bind(owner.updated_at)
                .execute(&pool)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn update(&self, id: ObjectId, patch: &OwnerPatch) -> RepositoryResult<Option<Owner>> {
        let pool = self.pool.clone();
        let patch = patch.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let patch = patch.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE owners SET
                        first_name = COALESCE($2, first_name),
                        last_name = COALESCE($3, last_name),
                        address = COALESCE($4, address),
                        city = COALESCE($5, city),
                        telephone = COALESCE($6, telephone),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, first_name, last_name, address, city, telephone,
                              created_at, updated_at
                    "#,
                )
                .bind(id.to_hex())
                .bind(patch.first_name)
                .bind(patch.last_name)
                .bind(patch.address)
                .bind(patch.city)
                .bind(patch.telephone)
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_owner).transpose()
            })
        })
        .await
    }

    async fn delete_cascade(&self, id: ObjectId) -> RepositoryResult<Option<CascadeReport>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let span = db_span!("delete_owner_cascade", id);
            Box::pin(
                async move {
                    let id = id.to_hex();
                    let mut tx = pool.begin().await?;

                    let found = sqlx::query("SELECT id FROM owners WHERE id = $1 FOR UPDATE")
                        .bind(&id)
                        .fetch_optional(&mut *tx)
                        .await?;
                    if found.is_none() {
                        tx.rollback().await?;
                        return Ok(None);
                    }

                    let visits = sqlx::query(
                        "DELETE FROM visits WHERE pet_id IN (SELECT id FROM pets WHERE owner_id = $1)",
                    )
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                    let pets = sqlx::query("DELETE FROM pets WHERE owner_id = $1")
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();

                    sqlx::query("DELETE FROM owners WHERE id = $1")
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?;

                    tx.commit()
                        .await
                        .map_err(|e| RepositoryError::Transaction(e.to_string()))?;

                    let span = tracing::Span::current();
                    span.record("deleted_pets", pets);
                    span.record("deleted_visits", visits);
                    Ok(Some(CascadeReport { pets, visits }))
                }
                .instrument(span),
            )
        })
        .await
    }
}

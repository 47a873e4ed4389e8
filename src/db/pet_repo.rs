//! Pet repository implementation for vetclinic

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use std::collections::BTreeMap;
use tracing::Instrument;

use crate::{
    db::{
        repository::{
            execute_with_retry, id_strings, stored_id, CascadeReport, PetRepository, Repository,
            RepositoryError, RepositoryResult, RetryConfig,
        },
        DbPool,
    },
    db_span,
    models::{ObjectId, Pet, PetPatch, Ref, Species},
};

/// PostgreSQL implementation of PetRepository
pub struct PgPetRepository {
    pool: DbPool,
    retry_config: RetryConfig,
}

impl PgPetRepository {
    /// Create a new PostgreSQL pet repository
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

    fn parse_species(raw: &str) -> RepositoryResult<Species> {
        Species::from_str(raw).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    /// Convert a database row to Pet
    fn row_to_pet(row: &PgRow) -> RepositoryResult<Pet> {
        let id: String = row.try_get("id")?;
        let species: String = row.try_get("species")?;
        let owner_id: String = row.try_get("owner_id")?;

        Ok(Pet {
            id: stored_id(&id)?,
            name: row.try_get("name")?,
            species: Self::parse_species(&species)?,
            age: row.try_get("age")?,
            birth_date: row.try_get("birth_date")?,
            owner: Ref::Unresolved(stored_id(&owner_id)?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Repository for PgPetRepository {
    type Entity = Pet;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Pet>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    SELECT id, name, species, age, birth_date, owner_id, created_at, updated_at
                    FROM pets
                    WHERE id = $1
                    "#,
                )
                .bind(id.to_hex())
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_pet).transpose()
            })
        })
        .await
    }

    async fn exists(&self, id: ObjectId) -> RepositoryResult<bool> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let result =
                    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pets WHERE id = $1)")
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
                let result = sqlx::query("DELETE FROM pets WHERE id = $1")
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
                let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pets")
                    .fetch_one(&pool)
                    .await?;

                Ok(count)
            })
        })
        .await
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM pets").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1 FROM pets LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::Connection(format!("Health check failed: {}", e)))
    }
}

#[async_trait]
impl PetRepository for PgPetRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Pet>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, species, age, birth_date, owner_id, created_at, updated_at
                    FROM pets
                    ORDER BY name COLLATE "C", id
                    "#,
                )
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_pet).collect()
            })
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Pet>> {
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
                    SELECT id, name, species, age, birth_date, owner_id, created_at, updated_at
                    FROM pets
                    WHERE id = ANY($1)
                    "#,
                )
                .bind(ids)
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_pet).collect()
            })
        })
        .await
    }

    async fn find_by_owner(&self, owner: ObjectId) -> RepositoryResult<Vec<Pet>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, species, age, birth_date, owner_id, created_at, updated_at
                    FROM pets
                    WHERE owner_id = $1
                    ORDER BY name COLLATE "C", id
                    "#,
                )
                .bind(owner.to_hex())
                .fetch_all(&pool)
                .await?;

                rows.iter().map(Self::row_to_pet).collect()
            })
        })
        .await
    }

    async fn count_by_species(&self) -> RepositoryResult<BTreeMap<Species, u64>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            Box::pin(async move {
                let rows = sqlx::query(
                    "SELECT species, COUNT(*) AS total FROM pets GROUP BY species",
                )
                .fetch_all(&pool)
                .await?;

                let mut counts = BTreeMap::new();
                for row in &rows {
                    let species: String = row.try_get("species")?;
                    let total: i64 = row.try_get("total")?;
                    counts.insert(Self::parse_species(&species)?, total.max(0) as u64);
                }
                Ok(counts)
            })
        })
        .await
    }

    async fn insert(&self, pet: &Pet) -> RepositoryResult<()> {
        let pool = self.pool.clone();
        let pet = pet.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let pet = pet.clone();
            Box::pin(async move {
                sqlx::query(
                    r#"
                    INSERT INTO pets (
                        id, name, species, age, birth_date, owner_id, created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(pet.id.to_hex())
                .bind(&pet.name)
                .bind(pet.species.as_str())
                .bind(pet.age)
                .bind(pet.birth_date)
                .bind(pet.owner_id().to_hex())
                .bind(pet.created_at)
                .bind(pet.updated_at)
                .execute(&pool)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn update(&self, id: ObjectId, patch: &PetPatch) -> RepositoryResult<Option<Pet>> {
        let pool = self.pool.clone();
        let patch = patch.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let patch = patch.clone();
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE pets SET
                        name = COALESCE($2, name),
                        species = COALESCE($3, species),
                        age = COALESCE($4, age),
                        birth_date = COALESCE($5, birth_date),
                        owner_id = COALESCE($6, owner_id),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, name, species, age, birth_date, owner_id, created_at, updated_at
                    "#,
                )
                .bind(id.to_hex())
                .bind(patch.name)
                .bind(patch.species.map(|s| s.as_str()))
                .bind(patch.age)
                .bind(patch.birth_date)
                .bind(patch.owner.map(|o| o.to_hex()))
                .fetch_optional(&pool)
                .await?;

                result.as_ref().map(Self::row_to_pet).transpose()
            })
        })
        .await
    }

    async fn delete_cascade(&self, id: ObjectId) -> RepositoryResult<Option<CascadeReport>> {
        let pool = self.pool.clone();

        execute_with_retry(&self.retry_config, || {
            let pool = pool.clone();
            let span = db_span!("delete_pet_cascade", id);
            Box::pin(
                async move {
                    let id = id.to_hex();
                    let mut tx = pool.begin().await?;

                    let found = sqlx::query("SELECT id FROM pets WHERE id = $1 FOR UPDATE")
                        .bind(&id)
                        .fetch_optional(&mut *tx)
                        .await?;
                    if found.is_none() {
                        tx.rollback().await?;
                        return Ok(None);
                    }

                    let visits = sqlx::query("DELETE FROM visits WHERE pet_id = $1")
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();

                    sqlx::query("DELETE FROM pets WHERE id = $1")
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?;

                    tx.commit()
                        .await
                        .map_err(|e| RepositoryError::Transaction(e.to_string()))?;

                    tracing::Span::current().record("deleted_visits", visits);
                    Ok(Some(CascadeReport { pets: 1, visits }))
                }
                .instrument(span),
            )
        })
        .await
    }
}

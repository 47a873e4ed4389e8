//! Database module for vetclinic
//!
//! This module provides database connectivity, connection pooling,
//! and repository implementations for persistent storage.

pub mod memory;
pub mod owner_repo;
pub mod pet_repo;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod vet_repo;
pub mod visit_repo;

// Re-export commonly used types
pub use memory::{Collection, InMemoryStore};
pub use owner_repo::PgOwnerRepository;
pub use pet_repo::PgPetRepository;
pub use pool::{create_pool, DbPool, PoolMetrics};
pub use repository::{
    CascadeReport, OwnerRepository, PetRepository, Repository, RepositoryError,
    RepositoryResult, VeterinarianRepository, VisitRepository,
};
pub use vet_repo::PgVeterinarianRepository;
pub use visit_repo::PgVisitRepository;

use sqlx::migrate::Migrator;
use std::sync::Arc;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::error::Result;

/// Database migrator for running schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// The four repositories behind one storage backend
#[derive(Clone)]
pub struct Repositories {
    pub owners: Arc<dyn OwnerRepository>,
    pub pets: Arc<dyn PetRepository>,
    pub veterinarians: Arc<dyn VeterinarianRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pool: Option<DbPool>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            owners: Arc::new(PgOwnerRepository::new(pool.clone())),
            pets: Arc::new(PgPetRepository::new(pool.clone())),
            veterinarians: Arc::new(PgVeterinarianRepository::new(pool.clone())),
            visits: Arc::new(PgVisitRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories over an in-memory store
    pub fn in_memory(store: &InMemoryStore) -> Self {
        Self {
            owners: Arc::new(store.owners()),
            pets: Arc::new(store.pets()),
            veterinarians: Arc::new(store.veterinarians()),
            visits: Arc::new(store.visits()),
            pool: None,
        }
    }

    /// Open the backend selected by `config`, running migrations if asked to
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config.storage_backend()? {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory(&InMemoryStore::new()))
            },
            StorageBackend::Postgres => {
                let pool = create_pool(config).await?;
                if config.run_migrations {
                    run_migrations(&pool).await?;
                    tracing::info!("Database migrations applied");
                }
                Ok(Self::postgres(pool))
            },
        }
    }

    /// Connection pool, when backed by PostgreSQL
    pub fn pool(&self) -> Option<&DbPool> {
        self.pool.as_ref()
    }

    /// Health of each repository, by collection name
    pub async fn health_checks(&self) -> Vec<(&'static str, RepositoryResult<()>)> {
        let (owners, pets, veterinarians, visits) = futures::join!(
            self.owners.health_check(),
            self.pets.health_check(),
            self.veterinarians.health_check(),
            self.visits.health_check(),
        );

        vec![
            ("owners", owners),
            ("pets", pets),
            ("veterinarians", veterinarians),
            ("visits", visits),
        ]
    }
}

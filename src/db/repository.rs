//! Repository pattern abstractions for vetclinic
//!
//! This module defines the repository traits and associated error types
//! for storage operations with proper error handling and retry logic.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoffBuilder};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;

use chrono::{DateTime, Utc};

use crate::models::{
    Identified, ObjectId, Owner, OwnerPatch, Pet, PetPatch, Species, Veterinarian,
    VeterinarianPatch, Visit, VisitPatch,
};

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Stored value could not be mapped back to a record
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool exhausted
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RepositoryError::Connection(_)
            | RepositoryError::PoolExhausted
            | RepositoryError::Timeout(_) => true,
            RepositoryError::Database(e) => {
                matches!(
                    e,
                    sqlx::Error::PoolTimedOut
                        | sqlx::Error::PoolClosed
                        | sqlx::Error::Io(_)
                        | sqlx::Error::Tls(_)
                )
            },
            _ => false,
        }
    }
}

/// Convert repository errors to application errors
impl From<RepositoryError> for crate::error::Error {
    fn from(err: RepositoryError) -> Self {
        crate::error::Error::database(err.to_string())
    }
}

/// Parse an identifier read back from storage
pub(crate) fn stored_id(raw: &str) -> RepositoryResult<ObjectId> {
    ObjectId::parse(raw.trim()).map_err(|e| RepositoryError::Serialization(e.message()))
}

/// Identifiers in their stored (hexadecimal) form
pub(crate) fn id_strings(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(ObjectId::to_hex).collect()
}

/// Dependents removed by a cascading delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub pets: u64,
    pub visits: u64,
}

/// Base repository trait
#[async_trait]
pub trait Repository: Send + Sync {
    /// The entity type this repository manages
    type Entity: Send + Sync;

    /// The ID type for the entity
    type Id: Send + Sync + Debug;

    /// Find an entity by ID
    async fn find_by_id(&self, id: Self::Id) -> RepositoryResult<Option<Self::Entity>>;

    /// Check if an entity exists
    async fn exists(&self, id: Self::Id) -> RepositoryResult<bool>;

    /// Delete an entity by ID, without touching dependents
    async fn delete(&self, id: Self::Id) -> RepositoryResult<bool>;

    /// Count total entities
    async fn count(&self) -> RepositoryResult<i64>;

    /// Remove every entity
    async fn clear(&self) -> RepositoryResult<u64>;

    /// Health check for the repository
    async fn health_check(&self) -> RepositoryResult<()>;
}

/// Owner storage
#[async_trait]
pub trait OwnerRepository: Repository<Entity = Owner, Id = ObjectId> {
    /// All owners sorted by (last name, first name), optionally restricted to
    /// last names containing `last_name` case-insensitively
    async fn find_all(&self, last_name: Option<&str>) -> RepositoryResult<Vec<Owner>>;

    /// Owners among `ids`, in no particular order
    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Owner>>;

    async fn insert(&self, owner: &Owner) -> RepositoryResult<()>;

    /// Apply a partial update; `None` when the owner does not exist
    async fn update(&self, id: ObjectId, patch: &OwnerPatch) -> RepositoryResult<Option<Owner>>;

    /// Delete the owner, their pets and those pets' visits as one unit.
    ///
    /// `None` when the owner does not exist.
    async fn delete_cascade(&self, id: ObjectId) -> RepositoryResult<Option<CascadeReport>>;
}

/// Pet storage
#[async_trait]
pub trait PetRepository: Repository<Entity = Pet, Id = ObjectId> {
    /// All pets sorted by name
    async fn find_all(&self) -> RepositoryResult<Vec<Pet>>;

    /// Pets among `ids`, in no particular order
    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Pet>>;

    /// Pets of one owner sorted by name
    async fn find_by_owner(&self, owner: ObjectId) -> RepositoryResult<Vec<Pet>>;

    /// Number of pets per species
    async fn count_by_species(&self) -> RepositoryResult<BTreeMap<Species, u64>>;

    async fn insert(&self, pet: &Pet) -> RepositoryResult<()>;

    async fn update(&self, id: ObjectId, patch: &PetPatch) -> RepositoryResult<Option<Pet>>;

    /// Delete the pet and its visits as one unit.
    ///
    /// `None` when the pet does not exist.
    async fn delete_cascade(&self, id: ObjectId) -> RepositoryResult<Option<CascadeReport>>;
}

/// Veterinarian storage
#[async_trait]
pub trait VeterinarianRepository: Repository<Entity = Veterinarian, Id = ObjectId> {
    /// All veterinarians sorted by (last name, first name)
    async fn find_all(&self) -> RepositoryResult<Vec<Veterinarian>>;

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Veterinarian>>;

    async fn insert(&self, veterinarian: &Veterinarian) -> RepositoryResult<()>;

    async fn update(
        &self,
        id: ObjectId,
        patch: &VeterinarianPatch,
    ) -> RepositoryResult<Option<Veterinarian>>;
}

/// Visit storage; every listing is sorted by date, most recent first
#[async_trait]
pub trait VisitRepository: Repository<Entity = Visit, Id = ObjectId> {
    async fn find_all(&self) -> RepositoryResult<Vec<Visit>>;

    async fn find_by_pet(&self, pet: ObjectId) -> RepositoryResult<Vec<Visit>>;

    async fn find_by_pets(&self, pets: &[ObjectId]) -> RepositoryResult<Vec<Visit>>;

    /// Visits dated in `[start, end)`
    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Visit>>;

    /// The `limit` most recent visits
    async fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<Visit>>;

    async fn insert(&self, visit: &Visit) -> RepositoryResult<()>;

    async fn update(&self, id: ObjectId, patch: &VisitPatch) -> RepositoryResult<Option<Visit>>;
}

/// Deduplicated identifiers of `items`, in first-seen order
pub fn distinct_ids<T>(items: &[T], id: impl Fn(&T) -> ObjectId) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = Vec::new();
    for item in items {
        let value = id(item);
        if !ids.contains(&value) {
            ids.push(value);
        }
    }
    ids
}

/// Identifiers of `items`
pub fn ids_of<T: Identified>(items: &[T]) -> Vec<ObjectId> {
    items.iter().map(Identified::id).collect()
}

/// Retry configuration for repository operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the initial backoff
    pub fn with_initial_backoff(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    /// Set the maximum backoff
    pub fn with_max_backoff(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    /// Set the backoff multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

/// Run `operation`, retrying transient failures with exponential backoff.
///
/// Gives up after `max_retries` retries or 30 seconds, whichever comes first.
pub async fn execute_with_retry<F, T>(config: &RetryConfig, operation: F) -> RepositoryResult<T>
where
    F: Fn() -> BoxFuture<'static, RepositoryResult<T>>,
{
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
        .with_max_interval(Duration::from_millis(config.max_backoff_ms))
        .with_multiplier(config.multiplier)
        .with_max_elapsed_time(Some(Duration::from_secs(30)))
        .build();

    let attempts = AtomicU32::new(0);
    let max_retries = config.max_retries;

    retry(backoff, || {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed);
        let pending = operation();
        async move {
            match pending.await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    tracing::warn!(error = ?e, attempt = attempt + 1, "Retrying database operation");
                    Err(backoff::Error::transient(e))
                },
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        }
    })
    .await
}

//! PostgreSQL connection pool

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

pub type DbPool = PgPool;

/// Open the clinic pool and make one round trip before handing it out
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let connect_options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| Error::config(format!("Invalid database URL: {}", e)))?
        .application_name("vetclinic")
        .log_statements(tracing::log::LevelFilter::Debug);

    let pool = PgPoolOptions::new()
        .max_connections(config.pool_max_size)
        .min_connections(config.pool_min_idle)
        .acquire_timeout(config.pool_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|e| Error::database(format!("Database unreachable: {}", e)))?;

    tracing::info!(
        max_connections = config.pool_max_size,
        min_idle = config.pool_min_idle,
        "Clinic database pool ready"
    );

    Ok(pool)
}

/// Pool usage snapshot reported by the readiness probe
#[derive(Debug, Clone, Copy)]
pub struct PoolMetrics {
    /// Current pool size
    pub size: u32,
    /// Number of idle connections
    pub idle: usize,
    /// Maximum pool size
    pub max_size: u32,
    /// Connections currently checked out
    pub in_use: u32,
}

impl PoolMetrics {
    /// Create metrics from a pool
    pub fn from_pool(pool: &DbPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
            max_size: pool.options().get_max_connections(),
            in_use: pool.size().saturating_sub(pool.num_idle() as u32),
        }
    }

    /// A connection is free or the pool can still grow
    pub fn is_healthy(&self) -> bool {
        self.idle > 0 || self.size < self.max_size
    }

    /// Get pool utilization as a percentage
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            return 0.0;
        }
        (self.in_use as f64 / self.max_size as f64) * 100.0
    }
}

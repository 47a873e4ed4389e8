//! vetclinic - REST backend for a small veterinary clinic
//!
//! Serves owners, pets, veterinarians and visits over HTTP, backed by
//! PostgreSQL or an in-memory store.

use std::sync::Arc;

use vetclinic::{config::Config, db::Repositories, error::Result, logging, Services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Arc::new(Config::from_env()?);

    // Validate configuration
    config.validate()?;

    // Initialize logging/tracing
    logging::init_tracing(&config.server.log_level, &config.server.environment)?;

    // Log configuration (with sensitive data masked)
    config.log_config();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting vetclinic");

    let repos = Repositories::connect(&config.database).await?;
    let services = Services::new(repos, &config.dashboard)?;

    vetclinic::create_server(config, services).await?;

    tracing::info!("vetclinic shutdown complete");
    Ok(())
}

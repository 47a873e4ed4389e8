//! Seed the clinic database with sample data
//!
//! `seed` replaces every collection with the sample clinic.
//! `seed --destroy` (or `-d`) empties every collection.

use anyhow::Context;
use chrono::Utc;
use vetclinic::{
    config::Config,
    db::{seed, Repositories},
    logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    logging::init_tracing(&config.server.log_level, &config.server.environment)?;

    let destroy = std::env::args()
        .skip(1)
        .any(|arg| arg == "--destroy" || arg == "-d");

    let repos = Repositories::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;

    if destroy {
        seed::destroy_data(&repos)
            .await
            .context("Failed to destroy clinic data")?;
        tracing::info!("Data destroyed");
    } else {
        let report = seed::import_data(&repos, Utc::now())
            .await
            .context("Failed to import clinic data")?;
        tracing::info!(
            owners = report.owners,
            veterinarians = report.veterinarians,
            pets = report.pets,
            visits = report.visits,
            "Data imported"
        );
    }

    Ok(())
}

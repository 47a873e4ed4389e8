//! vetclinic library
//!
//! This library exposes the core modules of the clinic backend for use in
//! integration tests, the seeding binary and as a typed client for other
//! applications.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod test_utils;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{Error, Result};

// Re-export model types
pub use models::{
    ObjectId, Owner, Pet, Ref, Species, ValidationError, ValidationErrorKind, Veterinarian, Visit,
};

// Re-export API server functions
pub use api::server::{create_router, create_server, shutdown_signal};

// Re-export health check types
pub use api::{
    BuildInfo, ComponentHealth, HealthResponse, HealthState, HealthStatus, ReadyResponse,
};

pub use client::{ClientError, ClinicClient};
pub use db::Repositories;
pub use services::Services;

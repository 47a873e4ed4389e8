//! Health check endpoints for vetclinic
//!
//! Liveness, readiness (every repository, plus the connection pool when
//! backed by PostgreSQL) and build information.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{AppState, ComponentHealth, HealthResponse, HealthStatus, ReadyResponse, BUILD_INFO};
use crate::db::{PoolMetrics, Repositories};

/// Last known health of each component
#[derive(Clone)]
pub struct HealthState {
    /// Shared state for component health tracking
    pub components: Arc<tokio::sync::RwLock<HashMap<String, ComponentHealth>>>,
}

impl HealthState {
    /// Create a new health state
    pub fn new() -> Self {
        Self {
            components: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        }
    }

    /// Update component health status
    pub async fn update_component(
        &self,
        name: String,
        status: HealthStatus,
        message: Option<String>,
    ) {
        let mut components = self.components.write().await;
        components.insert(
            name,
            ComponentHealth {
                status,
                message,
                last_check: Utc::now(),
            },
        );
    }

    /// Get overall health status
    pub async fn get_status(&self) -> HealthStatus {
        let components = self.components.read().await;

        // If any component is unhealthy, overall status is unhealthy
        if components.values().any(|c| c.status == HealthStatus::Unhealthy) {
            return HealthStatus::Unhealthy;
        }

        // If any component is degraded, overall status is degraded
        if components.values().any(|c| c.status == HealthStatus::Degraded) {
            return HealthStatus::Degraded;
        }

        HealthStatus::Healthy
    }

    /// Probe every repository and the pool, recording the results
    pub async fn refresh(&self, repos: &Repositories) {
        for (name, result) in repos.health_checks().await {
            match result {
                Ok(()) => {
                    self.update_component(name.to_string(), HealthStatus::Healthy, None)
                        .await
                },
                Err(e) => {
                    tracing::warn!(component = name, error = %e, "Health check failed");
                    self.update_component(
                        name.to_string(),
                        HealthStatus::Unhealthy,
                        Some(e.to_string()),
                    )
                    .await
                },
            }
        }

        if let Some(pool) = repos.pool() {
            let metrics = PoolMetrics::from_pool(pool);
            let status = if metrics.is_healthy() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            };
            self.update_component(
                "connection_pool".to_string(),
                status,
                Some(format!(
                    "{} of {} connections in use ({:.0}%)",
                    metrics.in_use,
                    metrics.max_size,
                    metrics.utilization()
                )),
            )
            .await;
        }

        tracing::debug!("Health check completed");
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Basic liveness check endpoint
///
/// Returns 200 OK if the service is alive.
/// This endpoint should be lightweight and not check external dependencies.
///
/// # Example
/// ```text
/// GET /healthz
/// ```
pub async fn health_check() -> Response {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Service is running".to_string()),
        timestamp: Utc::now(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness check endpoint
///
/// Checks every repository before answering; 503 when any is unreachable.
///
/// # Example
/// ```text
/// GET /readyz
/// ```
pub async fn ready_check(State(state): State<AppState>) -> Response {
    state.health.refresh(state.services.repositories()).await;

    let components = state.health.components.read().await.clone();
    let overall_status = state.health.get_status().await;

    let response = ReadyResponse {
        status: overall_status,
        checks: components,
        timestamp: Utc::now(),
    };

    let status_code = overall_status.to_status_code();
    (status_code, Json(response)).into_response()
}

/// Build information endpoint
///
/// Returns build metadata including version, commit hash, and build time.
///
/// # Example
/// ```text
/// GET /build
/// ```
pub async fn build_info() -> Response {
    (StatusCode::OK, Json(&BUILD_INFO)).into_response()
}

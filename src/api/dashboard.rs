//! `/api/dashboard` endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::api::AppState;
use crate::error::Result;
use crate::models::{DashboardSummary, MonthlyVisitReport};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/monthly-visits", get(monthly_visits))
}

async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>> {
    Ok(Json(state.services.dashboard_summary().await?))
}

/// Always 200; a store failure is reported inside the body
async fn monthly_visits(State(state): State<AppState>) -> Json<MonthlyVisitReport> {
    Json(state.services.monthly_visit_histogram(Utc::now()).await)
}

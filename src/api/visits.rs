//! `/api/visits` endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::{ApiJson, AppState};
use crate::error::Result;
use crate::models::{CreatedVisit, DeleteOutcome, Visit, VisitPayload};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_visits).post(create_visit))
        .route("/pets/:pet_id", get(list_visits_by_pet))
        .route("/:id", get(get_visit).put(update_visit).delete(delete_visit))
}

async fn list_visits(State(state): State<AppState>) -> Result<Json<Vec<Visit>>> {
    Ok(Json(state.services.list_visits().await?))
}

async fn get_visit(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Visit>> {
    Ok(Json(state.services.get_visit(&id).await?))
}

async fn list_visits_by_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<Visit>>> {
    Ok(Json(state.services.list_visits_by_pet(&pet_id).await?))
}

async fn create_visit(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VisitPayload>,
) -> Result<(StatusCode, Json<CreatedVisit>)> {
    let visit = state.services.create_visit(payload).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

async fn update_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<VisitPayload>,
) -> Result<Json<Visit>> {
    Ok(Json(state.services.update_visit(&id, payload).await?))
}

async fn delete_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>> {
    Ok(Json(state.services.delete_visit(&id).await?))
}

//! `/api/owners` endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::{ApiJson, AppState};
use crate::error::Result;
use crate::models::{DeleteOutcome, Owner, OwnerDetail, OwnerPayload};

/// Query string of the owner listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub last_name: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_owners).post(create_owner))
        .route("/:id", get(get_owner).put(update_owner).delete(delete_owner))
}

async fn list_owners(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<Owner>>> {
    let owners = state.services.list_owners(query.last_name.as_deref()).await?;
    Ok(Json(owners))
}

async fn get_owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OwnerDetail>> {
    Ok(Json(state.services.get_owner(&id).await?))
}

async fn create_owner(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<OwnerPayload>,
) -> Result<(StatusCode, Json<Owner>)> {
    let owner = state.services.create_owner(payload).await?;
    Ok((StatusCode::CREATED, Json(owner)))
}

async fn update_owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<OwnerPayload>,
) -> Result<Json<Owner>> {
    Ok(Json(state.services.update_owner(&id, payload).await?))
}

async fn delete_owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>> {
    Ok(Json(state.services.delete_owner(&id).await?))
}

//! `/api/veterinarians` endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::{ApiJson, AppState};
use crate::error::Result;
use crate::models::{DeleteOutcome, Veterinarian, VeterinarianPayload};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_veterinarians).post(create_veterinarian))
        .route(
            "/:id",
            get(get_veterinarian)
                .put(update_veterinarian)
                .delete(delete_veterinarian),
        )
}

async fn list_veterinarians(State(state): State<AppState>) -> Result<Json<Vec<Veterinarian>>> {
    Ok(Json(state.services.list_veterinarians().await?))
}

async fn get_veterinarian(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Veterinarian>> {
    Ok(Json(state.services.get_veterinarian(&id).await?))
}

async fn create_veterinarian(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VeterinarianPayload>,
) -> Result<(StatusCode, Json<Veterinarian>)> {
    let vet = state.services.create_veterinarian(payload).await?;
    Ok((StatusCode::CREATED, Json(vet)))
}

async fn update_veterinarian(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<VeterinarianPayload>,
) -> Result<Json<Veterinarian>> {
    Ok(Json(state.services.update_veterinarian(&id, payload).await?))
}

async fn delete_veterinarian(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>> {
    Ok(Json(state.services.delete_veterinarian(&id).await?))
}

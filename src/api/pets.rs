//! `/api/pets` endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::{ApiJson, AppState};
use crate::error::Result;
use crate::models::{DeleteOutcome, Pet, PetDetail, PetPayload};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pets).post(create_pet))
        .route("/owner/:owner_id", get(list_pets_by_owner))
        .route("/:id", get(get_pet).put(update_pet).delete(delete_pet))
}

async fn list_pets(State(state): State<AppState>) -> Result<Json<Vec<Pet>>> {
    Ok(Json(state.services.list_pets().await?))
}

async fn get_pet(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<PetDetail>> {
    Ok(Json(state.services.get_pet(&id).await?))
}

async fn list_pets_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<PetDetail>>> {
    Ok(Json(state.services.list_pets_by_owner(&owner_id).await?))
}

async fn create_pet(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PetPayload>,
) -> Result<(StatusCode, Json<Pet>)> {
    let pet = state.services.create_pet(payload).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

async fn update_pet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<PetPayload>,
) -> Result<Json<Pet>> {
    Ok(Json(state.services.update_pet(&id, payload).await?))
}

async fn delete_pet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>> {
    Ok(Json(state.services.delete_pet(&id).await?))
}

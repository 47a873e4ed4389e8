//! Typed HTTP client for the clinic API
//!
//! One async method per endpoint. Identifiers are checked locally before a
//! request is sent, so a malformed id never reaches the server.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    is_valid_object_id, CreatedVisit, DashboardSummary, DeleteOutcome, MonthlyVisitReport, Owner,
    OwnerDetail, OwnerPayload, Pet, PetDetail, PetPayload, Veterinarian, VeterinarianPayload,
    Visit, VisitPayload,
};

/// Result type for client calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`ClinicClient`]
#[derive(Error, Debug)]
pub enum ClientError {
    /// Identifier rejected locally; no request was made
    #[error("Invalid {entity} id: '{value}'")]
    InvalidId { entity: &'static str, value: String },

    /// A field the server would reject is missing; no request was made
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Transport or decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// An owner with the number of pets they have
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerWithPetCount {
    #[serde(flatten)]
    pub owner: Owner,
    pub pet_count: usize,
    pub has_pets: bool,
}

fn check_id(entity: &'static str, id: &str) -> ClientResult<()> {
    if is_valid_object_id(id) {
        Ok(())
    } else {
        Err(ClientError::InvalidId {
            entity,
            value: id.to_string(),
        })
    }
}

/// Client for the `/api` endpoints
#[derive(Debug, Clone)]
pub struct ClinicClient {
    http: Client,
    base_url: String,
}

impl ClinicClient {
    /// `base_url` is the API root, e.g. `http://localhost:2000/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "API request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }

    // Owners

    pub async fn list_owners(&self) -> ClientResult<Vec<Owner>> {
        self.send(self.http.get(self.url("/owners"))).await
    }

    /// Owners whose last name contains `last_name`, ignoring case
    pub async fn search_owners(&self, last_name: &str) -> ClientResult<Vec<Owner>> {
        self.send(
            self.http
                .get(self.url("/owners"))
                .query(&[("lastName", last_name)]),
        )
        .await
    }

    /// Every owner with their pet count.
    ///
    /// Pets are fetched per owner; when that fails the owner is reported
    /// with no pets rather than failing the whole listing.
    pub async fn owners_with_pet_counts(&self) -> ClientResult<Vec<OwnerWithPetCount>> {
        let owners = self.list_owners().await?;
        let mut result = Vec::with_capacity(owners.len());

        for owner in owners {
            let pet_count = match self.pets_by_owner(&owner.id.to_string()).await {
                Ok(pets) => pets.len(),
                Err(e) => {
                    tracing::warn!(owner_id = %owner.id, error = %e, "Could not count pets");
                    0
                },
            };
            result.push(OwnerWithPetCount {
                owner,
                pet_count,
                has_pets: pet_count > 0,
            });
        }

        Ok(result)
    }

    pub async fn get_owner(&self, id: &str) -> ClientResult<OwnerDetail> {
        check_id("owner", id)?;
        self.send(self.http.get(self.url(&format!("/owners/{}", id))))
            .await
    }

    pub async fn create_owner(&self, owner: &OwnerPayload) -> ClientResult<Owner> {
        self.send(self.http.post(self.url("/owners")).json(owner))
            .await
    }

    pub async fn update_owner(&self, id: &str, owner: &OwnerPayload) -> ClientResult<Owner> {
        check_id("owner", id)?;
        self.send(self.http.put(self.url(&format!("/owners/{}", id))).json(owner))
            .await
    }

    pub async fn delete_owner(&self, id: &str) -> ClientResult<DeleteOutcome> {
        check_id("owner", id)?;
        self.send(self.http.delete(self.url(&format!("/owners/{}", id))))
            .await
    }

    // Pets

    pub async fn list_pets(&self) -> ClientResult<Vec<Pet>> {
        self.send(self.http.get(self.url("/pets"))).await
    }

    pub async fn get_pet(&self, id: &str) -> ClientResult<PetDetail> {
        check_id("pet", id)?;
        self.send(self.http.get(self.url(&format!("/pets/{}", id))))
            .await
    }

    pub async fn pets_by_owner(&self, owner_id: &str) -> ClientResult<Vec<PetDetail>> {
        check_id("owner", owner_id)?;
        self.send(self.http.get(self.url(&format!("/pets/owner/{}", owner_id))))
            .await
    }

    /// Create a pet; the owner id must be present and well formed
    pub async fn create_pet(&self, pet: &PetPayload) -> ClientResult<Pet> {
        let owner = pet.owner.as_deref().ok_or(ClientError::MissingField("owner"))?;
        check_id("owner", owner)?;
        self.send(self.http.post(self.url("/pets")).json(pet)).await
    }

    pub async fn update_pet(&self, id: &str, pet: &PetPayload) -> ClientResult<Pet> {
        check_id("pet", id)?;
        self.send(self.http.put(self.url(&format!("/pets/{}", id))).json(pet))
            .await
    }

    pub async fn delete_pet(&self, id: &str) -> ClientResult<DeleteOutcome> {
        check_id("pet", id)?;
        self.send(self.http.delete(self.url(&format!("/pets/{}", id))))
            .await
    }

    // Veterinarians

    pub async fn list_veterinarians(&self) -> ClientResult<Vec<Veterinarian>> {
        self.send(self.http.get(self.url("/veterinarians"))).await
    }

    pub async fn get_veterinarian(&self, id: &str) -> ClientResult<Veterinarian> {
        check_id("veterinarian", id)?;
        self.send(self.http.get(self.url(&format!("/veterinarians/{}", id))))
            .await
    }

    pub async fn create_veterinarian(
        &self,
        veterinarian: &VeterinarianPayload,
    ) -> ClientResult<Veterinarian> {
        self.send(self.http.post(self.url("/veterinarians")).json(veterinarian))
            .await
    }

    pub async fn update_veterinarian(
        &self,
        id: &str,
        veterinarian: &VeterinarianPayload,
    ) -> ClientResult<Veterinarian> {
        check_id("veterinarian", id)?;
        self.send(
            self.http
                .put(self.url(&format!("/veterinarians/{}", id)))
                .json(veterinarian),
        )
        .await
    }

    pub async fn delete_veterinarian(&self, id: &str) -> ClientResult<DeleteOutcome> {
        check_id("veterinarian", id)?;
        self.send(self.http.delete(self.url(&format!("/veterinarians/{}", id))))
            .await
    }

    // Visits

    pub async fn list_visits(&self) -> ClientResult<Vec<Visit>> {
        self.send(self.http.get(self.url("/visits"))).await
    }

    pub async fn get_visit(&self, id: &str) -> ClientResult<Visit> {
        check_id("visit", id)?;
        self.send(self.http.get(self.url(&format!("/visits/{}", id))))
            .await
    }

    pub async fn visits_by_pet(&self, pet_id: &str) -> ClientResult<Vec<Visit>> {
        check_id("pet", pet_id)?;
        self.send(self.http.get(self.url(&format!("/visits/pets/{}", pet_id))))
            .await
    }

    pub async fn create_visit(&self, visit: &VisitPayload) -> ClientResult<CreatedVisit> {
        self.send(self.http.post(self.url("/visits")).json(visit))
            .await
    }

    pub async fn update_visit(&self, id: &str, visit: &VisitPayload) -> ClientResult<Visit> {
        check_id("visit", id)?;
        self.send(self.http.put(self.url(&format!("/visits/{}", id))).json(visit))
            .await
    }

    pub async fn delete_visit(&self, id: &str) -> ClientResult<DeleteOutcome> {
        check_id("visit", id)?;
        self.send(self.http.delete(self.url(&format!("/visits/{}", id))))
            .await
    }

    // Dashboard

    pub async fn dashboard_summary(&self) -> ClientResult<DashboardSummary> {
        self.send(self.http.get(self.url("/dashboard/summary"))).await
    }

    pub async fn monthly_visits(&self) -> ClientResult<MonthlyVisitReport> {
        self.send(self.http.get(self.url("/dashboard/monthly-visits")))
            .await
    }
}

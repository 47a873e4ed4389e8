use tracing::info;

use super::{parse_id, Services};
use crate::error::{Error, Result};
use crate::models::{DeleteOutcome, Veterinarian, VeterinarianPayload};

impl Services {
    /// All veterinarians sorted by (lastName, firstName)
    pub async fn list_veterinarians(&self) -> Result<Vec<Veterinarian>> {
        Ok(self.repos.veterinarians.find_all().await?)
    }

    pub async fn get_veterinarian(&self, id: &str) -> Result<Veterinarian> {
        let id = parse_id("veterinarian", id)?;
        self.repos
            .veterinarians
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Veterinarian"))
    }

    pub async fn create_veterinarian(&self, payload: VeterinarianPayload) -> Result<Veterinarian> {
        let vet = Veterinarian::create(payload.into_new()?);
        self.repos.veterinarians.insert(&vet).await?;
        info!(veterinarian_id = %vet.id, "Veterinarian created");
        Ok(vet)
    }

    pub async fn update_veterinarian(
        &self,
        id: &str,
        payload: VeterinarianPayload,
    ) -> Result<Veterinarian> {
        let id = parse_id("veterinarian", id)?;
        let patch = payload.into_patch()?;

        let vet = self
            .repos
            .veterinarians
            .update(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found("Veterinarian"))?;

        info!(veterinarian_id = %id, "Veterinarian updated");
        Ok(vet)
    }

    /// Delete a veterinarian; their visits keep a reference that now reads as `null`
    pub async fn delete_veterinarian(&self, id: &str) -> Result<DeleteOutcome> {
        let id = parse_id("veterinarian", id)?;
        if !self.repos.veterinarians.delete(id).await? {
            return Err(Error::not_found("Veterinarian"));
        }

        info!(veterinarian_id = %id, "Veterinarian deleted");
        Ok(DeleteOutcome::new("Veterinarian removed"))
    }
}

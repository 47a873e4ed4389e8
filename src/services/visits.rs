use tracing::info;

use super::{parse_id, Services};
use crate::error::{Error, Result};
use crate::models::{CreatedVisit, DeleteOutcome, ObjectId, Pet, Visit, VisitPayload};

impl Services {
    /// All visits, newest first, pet and veterinarian resolved
    pub async fn list_visits(&self) -> Result<Vec<Visit>> {
        let visits = self.repos.visits.find_all().await?;
        self.resolve_visits(visits, true).await
    }

    pub async fn get_visit(&self, id: &str) -> Result<Visit> {
        let id = parse_id("visit", id)?;
        let visit = self
            .repos
            .visits
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Visit"))?;

        self.resolve_visit(visit).await
    }

    /// Visits of one pet, newest first, veterinarian resolved
    pub async fn list_visits_by_pet(&self, pet_id: &str) -> Result<Vec<Visit>> {
        let pet_id = parse_id("pet", pet_id)?;
        let visits = self.repos.visits.find_by_pet(pet_id).await?;
        self.resolve_visits(visits, false).await
    }

    /// Record a visit for an existing pet; the response names the pet's owner
    pub async fn create_visit(&self, payload: VisitPayload) -> Result<CreatedVisit> {
        let new = payload.into_new()?;
        let pet = self.existing_pet(new.pet).await?;

        let visit = Visit::create(new);
        self.repos.visits.insert(&visit).await?;
        info!(visit_id = %visit.id, pet_id = %pet.id, "Visit created");

        Ok(CreatedVisit {
            visit: self.resolve_visit(visit).await?,
            pet_owner: pet.owner_id(),
        })
    }

    /// Partial update; a new pet must exist
    pub async fn update_visit(&self, id: &str, payload: VisitPayload) -> Result<Visit> {
        let id = parse_id("visit", id)?;
        let patch = payload.into_patch()?;

        if !self.repos.visits.exists(id).await? {
            return Err(Error::not_found("Visit"));
        }
        if let Some(pet) = patch.pet {
            self.existing_pet(pet).await?;
        }

        let visit = self
            .repos
            .visits
            .update(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found("Visit"))?;

        info!(visit_id = %id, "Visit updated");
        self.resolve_visit(visit).await
    }

    pub async fn delete_visit(&self, id: &str) -> Result<DeleteOutcome> {
        let id = parse_id("visit", id)?;
        if !self.repos.visits.delete(id).await? {
            return Err(Error::not_found("Visit"));
        }

        info!(visit_id = %id, "Visit deleted");
        Ok(DeleteOutcome::new("Visit removed"))
    }

    async fn existing_pet(&self, id: ObjectId) -> Result<Pet> {
        self.repos
            .pets
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Pet"))
    }

    async fn resolve_visit(&self, visit: Visit) -> Result<Visit> {
        let mut visits = self.resolve_visits(vec![visit], true).await?;
        visits
            .pop()
            .ok_or_else(|| Error::internal("Visit lost while resolving references"))
    }
}

use tracing::info;

use super::{parse_id, Services};
use crate::error::{Error, Result};
use crate::models::{DeleteOutcome, ObjectId, Pet, PetDetail, PetPayload};

impl Services {
    /// All pets sorted by name, owners resolved
    pub async fn list_pets(&self) -> Result<Vec<Pet>> {
        let pets = self.repos.pets.find_all().await?;
        self.resolve_owners(pets).await
    }

    /// One pet with its owner resolved and its visits attached
    pub async fn get_pet(&self, id: &str) -> Result<PetDetail> {
        let id = parse_id("pet", id)?;
        let pet = self
            .repos
            .pets
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Pet"))?;

        let pet = self.with_owner(pet).await?;
        let mut details = self.attach_visits(vec![pet]).await?;
        details.pop().ok_or_else(|| Error::not_found("Pet"))
    }

    /// Pets of one owner, sorted by name, each with its visits
    pub async fn list_pets_by_owner(&self, owner_id: &str) -> Result<Vec<PetDetail>> {
        let owner_id = parse_id("owner", owner_id)?;
        let pets = self.repos.pets.find_by_owner(owner_id).await?;
        self.attach_visits(pets).await
    }

    /// Create a pet for an existing owner
    pub async fn create_pet(&self, payload: PetPayload) -> Result<Pet> {
        let new = payload.into_new()?;
        self.ensure_owner_exists(new.owner).await?;

        let pet = Pet::create(new);
        self.repos.pets.insert(&pet).await?;
        info!(pet_id = %pet.id, owner_id = %pet.owner_id(), "Pet created");

        self.with_owner(pet).await
    }

    /// Partial update; a new owner must exist
    pub async fn update_pet(&self, id: &str, payload: PetPayload) -> Result<Pet> {
        let id = parse_id("pet", id)?;
        let patch = payload.into_patch()?;

        if !self.repos.pets.exists(id).await? {
            return Err(Error::not_found("Pet"));
        }
        if let Some(owner) = patch.owner {
            self.ensure_owner_exists(owner).await?;
        }

        let pet = self
            .repos
            .pets
            .update(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found("Pet"))?;

        info!(pet_id = %id, "Pet updated");
        self.with_owner(pet).await
    }

    /// Delete a pet and its visits
    pub async fn delete_pet(&self, id: &str) -> Result<DeleteOutcome> {
        let id = parse_id("pet", id)?;
        let report = self
            .repos
            .pets
            .delete_cascade(id)
            .await?
            .ok_or_else(|| Error::not_found("Pet"))?;

        info!(pet_id = %id, deleted_visits = report.visits, "Pet deleted");
        Ok(DeleteOutcome::new("Pet removed").with_visits(report.visits))
    }

    async fn ensure_owner_exists(&self, owner: ObjectId) -> Result<()> {
        if self.repos.owners.exists(owner).await? {
            Ok(())
        } else {
            Err(Error::not_found("Owner"))
        }
    }

    async fn with_owner(&self, pet: Pet) -> Result<Pet> {
        let mut pets = self.resolve_owners(vec![pet]).await?;
        pets.pop().ok_or_else(|| Error::internal("Pet lost while resolving its owner"))
    }
}

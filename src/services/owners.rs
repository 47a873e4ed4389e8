use tracing::{debug, info};

use super::{parse_id, Services};
use crate::error::{Error, Result};
use crate::models::{DeleteOutcome, Owner, OwnerDetail, OwnerPayload};

impl Services {
    /// All owners sorted by (lastName, firstName); a non-blank filter keeps
    /// those whose last name contains it, ignoring case
    pub async fn list_owners(&self, last_name: Option<&str>) -> Result<Vec<Owner>> {
        let filter = last_name.map(str::trim).filter(|f| !f.is_empty());
        let owners = self.repos.owners.find_all(filter).await?;
        debug!(count = owners.len(), filter = ?filter, "Listed owners");
        Ok(owners)
    }

    /// One owner with their pets, each pet carrying its visits
    pub async fn get_owner(&self, id: &str) -> Result<OwnerDetail> {
        let id = parse_id("owner", id)?;
        let owner = self
            .repos
            .owners
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Owner"))?;

        let pets = self.repos.pets.find_by_owner(id).await?;
        let pets = self.attach_visits(pets).await?;

        Ok(OwnerDetail { owner, pets })
    }

    pub async fn create_owner(&self, payload: OwnerPayload) -> Result<Owner> {
        let owner = Owner::create(payload.into_new()?);
        self.repos.owners.insert(&owner).await?;
        info!(owner_id = %owner.id, "Owner created");
        Ok(owner)
    }

    /// Partial update; only supplied fields change
    pub async fn update_owner(&self, id: &str, payload: OwnerPayload) -> Result<Owner> {
        let id = parse_id("owner", id)?;
        let patch = payload.into_patch()?;

        let owner = self
            .repos
            .owners
            .update(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found("Owner"))?;

        info!(owner_id = %id, "Owner updated");
        Ok(owner)
    }

    /// Delete an owner together with their pets and those pets' visits
    pub async fn delete_owner(&self, id: &str) -> Result<DeleteOutcome> {
        let id = parse_id("owner", id)?;
        let report = self
            .repos
            .owners
            .delete_cascade(id)
            .await?
            .ok_or_else(|| Error::not_found("Owner"))?;

        info!(
            owner_id = %id,
            deleted_pets = report.pets,
            deleted_visits = report.visits,
            "Owner deleted"
        );

        Ok(DeleteOutcome::new("Owner removed")
            .with_pets(report.pets)
            .with_visits(report.visits))
    }
}

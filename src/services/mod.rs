//! Clinic operations
//!
//! Each operation validates its identifiers, talks to the repositories and
//! shapes the records it returns (references resolved, dependents attached).
//! HTTP handlers are thin wrappers over these methods.

pub mod dashboard;
pub mod owners;
pub mod pets;
pub mod veterinarians;
pub mod visits;

use chrono::Locale;
use std::collections::HashMap;

use crate::config::DashboardConfig;
use crate::db::repository::distinct_ids;
use crate::db::Repositories;
use crate::error::{Error, Result};
use crate::models::{index_by_id, ObjectId, Pet, PetDetail, Ref, Visit};

pub use dashboard::{build_monthly_histogram, histogram_window};

/// Parse a path or body identifier, naming the entity it addresses on failure
pub fn parse_id(entity: &'static str, raw: &str) -> Result<ObjectId> {
    ObjectId::parse(raw).map_err(|_| Error::invalid_id(entity, raw))
}

/// Entry point for every clinic operation
#[derive(Clone)]
pub struct Services {
    repos: Repositories,
    locale: Locale,
    recent_visits: usize,
}

impl Services {
    /// Create the service set; fails on an unsupported dashboard locale
    pub fn new(repos: Repositories, dashboard: &DashboardConfig) -> Result<Self> {
        Ok(Self {
            repos,
            locale: dashboard.chrono_locale()?,
            recent_visits: dashboard.recent_visits,
        })
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Replace pet owners with their `{_id, firstName, lastName}` summary.
    ///
    /// Owners that no longer exist stay as bare identifiers.
    async fn resolve_owners(&self, pets: Vec<Pet>) -> Result<Vec<Pet>> {
        let owner_ids = distinct_ids(&pets, Pet::owner_id);
        if owner_ids.is_empty() {
            return Ok(pets);
        }

        let owners = self.repos.owners.find_by_ids(&owner_ids).await?;
        let index = index_by_id(owners.iter().map(|o| o.summary()));

        Ok(pets
            .into_iter()
            .map(|mut pet| {
                pet.owner = pet.owner.resolve_from(&index);
                pet
            })
            .collect())
    }

    /// Resolve visit veterinarians, and pets when `with_pets` is set.
    ///
    /// A veterinarian reference pointing at a deleted record becomes `null`.
    async fn resolve_visits(&self, visits: Vec<Visit>, with_pets: bool) -> Result<Vec<Visit>> {
        if visits.is_empty() {
            return Ok(visits);
        }

        let vet_ids: Vec<ObjectId> = {
            let mut ids = Vec::new();
            for id in visits.iter().filter_map(Visit::veterinarian_id) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            ids
        };
        let vets = if vet_ids.is_empty() {
            HashMap::new()
        } else {
            let found = self.repos.veterinarians.find_by_ids(&vet_ids).await?;
            index_by_id(found.iter().map(|v| v.summary()))
        };

        let pets = if with_pets {
            let pet_ids = distinct_ids(&visits, Visit::pet_id);
            let found = self.repos.pets.find_by_ids(&pet_ids).await?;
            Some(index_by_id(found.iter().map(|p| p.summary())))
        } else {
            None
        };

        Ok(visits
            .into_iter()
            .map(|mut visit| {
                visit.veterinarian = visit
                    .veterinarian
                    .map(|vet| vet.resolve_from(&vets))
                    .filter(Ref::is_resolved);
                if let Some(pets) = &pets {
                    visit.pet = visit.pet.resolve_from(pets);
                }
                visit
            })
            .collect())
    }

    /// Attach each pet's visits, newest first, with veterinarians resolved
    async fn attach_visits(&self, pets: Vec<Pet>) -> Result<Vec<PetDetail>> {
        let pet_ids: Vec<ObjectId> = pets.iter().map(|p| p.id).collect();
        let visits = self.repos.visits.find_by_pets(&pet_ids).await?;
        let visits = self.resolve_visits(visits, false).await?;

        let mut by_pet: HashMap<ObjectId, Vec<Visit>> = HashMap::new();
        for visit in visits {
            by_pet.entry(visit.pet_id()).or_default().push(visit);
        }

        Ok(pets
            .into_iter()
            .map(|pet| {
                let visits = by_pet.remove(&pet.id).unwrap_or_default();
                PetDetail { pet, visits }
            })
            .collect())
    }
}

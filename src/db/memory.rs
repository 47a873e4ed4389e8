//! In-memory storage backend
//!
//! Implements every repository trait over one shared set of maps, for local
//! development (`STORAGE_BACKEND=memory`) and tests. Cascading deletes run
//! under a single lock. Individual collections can be made to fail, which
//! tests use to exercise degraded paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::db::repository::{
    CascadeReport, OwnerRepository, PetRepository, Repository, RepositoryError,
    RepositoryResult, VeterinarianRepository, VisitRepository,
};
use crate::models::{
    ObjectId, Owner, OwnerPatch, Pet, PetPatch, Species, Veterinarian, VeterinarianPatch, Visit,
    VisitPatch,
};

/// One of the four record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Owners,
    Pets,
    Veterinarians,
    Visits,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Owners => "owners",
            Collection::Pets => "pets",
            Collection::Veterinarians => "veterinarians",
            Collection::Visits => "visits",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct ClinicData {
    owners: HashMap<ObjectId, Owner>,
    pets: HashMap<ObjectId, Pet>,
    veterinarians: HashMap<ObjectId, Veterinarian>,
    visits: HashMap<ObjectId, Visit>,
}

/// Shared in-memory store; clones see the same data
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<ClinicData>>,
    failing: Arc<Mutex<HashSet<Collection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation touching `collection` fail until restored
    pub fn fail_collection(&self, collection: Collection) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection);
    }

    pub fn restore_collection(&self, collection: Collection) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&collection);
    }

    pub fn owners(&self) -> MemoryOwnerRepository {
        MemoryOwnerRepository {
            store: self.clone(),
        }
    }

    pub fn pets(&self) -> MemoryPetRepository {
        MemoryPetRepository {
            store: self.clone(),
        }
    }

    pub fn veterinarians(&self) -> MemoryVeterinarianRepository {
        MemoryVeterinarianRepository {
            store: self.clone(),
        }
    }

    pub fn visits(&self) -> MemoryVisitRepository {
        MemoryVisitRepository {
            store: self.clone(),
        }
    }

    fn check(&self, collections: &[Collection]) -> RepositoryResult<()> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        match collections.iter().find(|c| failing.contains(c)) {
            Some(collection) => Err(RepositoryError::Connection(format!(
                "{} collection unavailable",
                collection
            ))),
            None => Ok(()),
        }
    }

    fn data(&self) -> MutexGuard<'_, ClinicData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sorted_owners(mut owners: Vec<Owner>) -> Vec<Owner> {
    owners.sort_by(|a, b| {
        (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
    });
    owners
}

fn sorted_pets(mut pets: Vec<Pet>) -> Vec<Pet> {
    pets.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
    pets
}

fn sorted_visits(mut visits: Vec<Visit>) -> Vec<Visit> {
    visits.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    visits
}

/// Owner repository over an [`InMemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryOwnerRepository {
    store: InMemoryStore,
}

#[async_trait]
impl Repository for MemoryOwnerRepository {
    type Entity = Owner;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Owner>> {
        self.store.check(&[Collection::Owners])?;
        Ok(self.store.data().owners.get(&id).cloned())
    }

    async fn exists(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Owners])?;
        Ok(self.store.data().owners.contains_key(&id))
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Owners])?;
        Ok(self.store.data().owners.remove(&id).is_some())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.store.check(&[Collection::Owners])?;
        Ok(self.store.data().owners.len() as i64)
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        self.store.check(&[Collection::Owners])?;
        let mut data = self.store.data();
        let removed = data.owners.len() as u64;
        data.owners.clear();
        Ok(removed)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        self.store.check(&[Collection::Owners])
    }
}

#[async_trait]
impl OwnerRepository for MemoryOwnerRepository {
    async fn find_all(&self, last_name: Option<&str>) -> RepositoryResult<Vec<Owner>> {
        self.store.check(&[Collection::Owners])?;
        let needle = last_name
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let owners = self
            .store
            .data()
            .owners
            .values()
            .filter(|o| match &needle {
                Some(needle) => o.last_name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        Ok(sorted_owners(owners))
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Owner>> {
        self.store.check(&[Collection::Owners])?;
        let data = self.store.data();
        Ok(ids.iter().filter_map(|id| data.owners.get(id).cloned()).collect())
    }

    async fn insert(&self, owner: &Owner) -> RepositoryResult<()> {
        self.store.check(&[Collection::Owners])?;
        self.store.data().owners.insert(owner.id, owner.clone());
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &OwnerPatch) -> RepositoryResult<Option<Owner>> {
        self.store.check(&[Collection::Owners])?;
        let mut data = self.store.data();
        Ok(data.owners.get_mut(&id).map(|owner| {
            owner.apply(patch.clone());
            owner.clone()
        }))
    }

    async fn delete_cascade(&self, id: ObjectId) -> RepositoryResult<Option<CascadeReport>> {
        self.store
            .check(&[Collection::Owners, Collection::Pets, Collection::Visits])?;
        let mut data = self.store.data();

        if data.owners.remove(&id).is_none() {
            return Ok(None);
        }

        let pet_ids: HashSet<ObjectId> = data
            .pets
            .values()
            .filter(|p| p.owner_id() == id)
            .map(|p| p.id)
            .collect();
        data.pets.retain(|pet_id, _| !pet_ids.contains(pet_id));

        let before = data.visits.len();
        data.visits.retain(|_, v| !pet_ids.contains(&v.pet_id()));

        Ok(Some(CascadeReport {
            pets: pet_ids.len() as u64,
            visits: (before - data.visits.len()) as u64,
        }))
    }
}

/// Pet repository over an [`InMemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryPetRepository {
    store: InMemoryStore,
}

#[async_trait]
impl Repository for MemoryPetRepository {
    type Entity = Pet;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Pet>> {
        self.store.check(&[Collection::Pets])?;
        Ok(self.store.data().pets.get(&id).cloned())
    }

    async fn exists(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Pets])?;
        Ok(self.store.data().pets.contains_key(&id))
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Pets])?;
        Ok(self.store.data().pets.remove(&id).is_some())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.store.check(&[Collection::Pets])?;
        Ok(self.store.data().pets.len() as i64)
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        self.store.check(&[Collection::Pets])?;
        let mut data = self.store.data();
        let removed = data.pets.len() as u64;
        data.pets.clear();
        Ok(removed)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        self.store.check(&[Collection::Pets])
    }
}

#[async_trait]
impl PetRepository for MemoryPetRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Pet>> {
        self.store.check(&[Collection::Pets])?;
        let pets = self.store.data().pets.values().cloned().collect();
        Ok(sorted_pets(pets))
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Pet>> {
        self.store.check(&[Collection::Pets])?;
        let data = self.store.data();
        Ok(ids.iter().filter_map(|id| data.pets.get(id).cloned()).collect())
    }

    async fn find_by_owner(&self, owner: ObjectId) -> RepositoryResult<Vec<Pet>> {
        self.store.check(&[Collection::Pets])?;
        let pets = self
            .store
            .data()
            .pets
            .values()
            .filter(|p| p.owner_id() == owner)
            .cloned()
            .collect();
        Ok(sorted_pets(pets))
    }

    async fn count_by_species(&self) -> RepositoryResult<BTreeMap<Species, u64>> {
        self.store.check(&[Collection::Pets])?;
        let mut counts = BTreeMap::new();
        for pet in self.store.data().pets.values() {
            *counts.entry(pet.species).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn insert(&self, pet: &Pet) -> RepositoryResult<()> {
        self.store.check(&[Collection::Pets])?;
        self.store.data().pets.insert(pet.id, pet.clone());
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &PetPatch) -> RepositoryResult<Option<Pet>> {
        self.store.check(&[Collection::Pets])?;
        let mut data = self.store.data();
        Ok(data.pets.get_mut(&id).map(|pet| {
            pet.apply(patch.clone());
            pet.clone()
        }))
    }

    async fn delete_cascade(&self, id: ObjectId) -> RepositoryResult<Option<CascadeReport>> {
        self.store.check(&[Collection::Pets, Collection::Visits])?;
        let mut data = self.store.data();

        if data.pets.remove(&id).is_none() {
            return Ok(None);
        }

        let before = data.visits.len();
        data.visits.retain(|_, v| v.pet_id() != id);

        Ok(Some(CascadeReport {
            pets: 1,
            visits: (before - data.visits.len()) as u64,
        }))
    }
}

/// Veterinarian repository over an [`InMemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryVeterinarianRepository {
    store: InMemoryStore,
}

#[async_trait]
impl Repository for MemoryVeterinarianRepository {
    type Entity = Veterinarian;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Veterinarian>> {
        self.store.check(&[Collection::Veterinarians])?;
        Ok(self.store.data().veterinarians.get(&id).cloned())
    }

    async fn exists(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Veterinarians])?;
        Ok(self.store.data().veterinarians.contains_key(&id))
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Veterinarians])?;
        Ok(self.store.data().veterinarians.remove(&id).is_some())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.store.check(&[Collection::Veterinarians])?;
        Ok(self.store.data().veterinarians.len() as i64)
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        self.store.check(&[Collection::Veterinarians])?;
        let mut data = self.store.data();
        let removed = data.veterinarians.len() as u64;
        data.veterinarians.clear();
        Ok(removed)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        self.store.check(&[Collection::Veterinarians])
    }
}

#[async_trait]
impl VeterinarianRepository for MemoryVeterinarianRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Veterinarian>> {
        self.store.check(&[Collection::Veterinarians])?;
        let mut vets: Vec<Veterinarian> =
            self.store.data().veterinarians.values().cloned().collect();
        vets.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(vets)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<Veterinarian>> {
        self.store.check(&[Collection::Veterinarians])?;
        let data = self.store.data();
        Ok(ids
            .iter()
            .filter_map(|id| data.veterinarians.get(id).cloned())
            .collect())
    }

    async fn insert(&self, veterinarian: &Veterinarian) -> RepositoryResult<()> {
        self.store.check(&[Collection::Veterinarians])?;
        self.store
            .data()
            .veterinarians
            .insert(veterinarian.id, veterinarian.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: ObjectId,
        patch: &VeterinarianPatch,
    ) -> RepositoryResult<Option<Veterinarian>> {
        self.store.check(&[Collection::Veterinarians])?;
        let mut data = self.store.data();
        Ok(data.veterinarians.get_mut(&id).map(|vet| {
            vet.apply(patch.clone());
            vet.clone()
        }))
    }
}

/// Visit repository over an [`InMemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryVisitRepository {
    store: InMemoryStore,
}

impl MemoryVisitRepository {
    fn filtered(&self, keep: impl Fn(&Visit) -> bool) -> RepositoryResult<Vec<Visit>> {
        self.store.check(&[Collection::Visits])?;
        let visits = self
            .store
            .data()
            .visits
            .values()
            .filter(|v| keep(v))
            .cloned()
            .collect();
        Ok(sorted_visits(visits))
    }
}

#[async_trait]
impl Repository for MemoryVisitRepository {
    type Entity = Visit;
    type Id = ObjectId;

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<Visit>> {
        self.store.check(&[Collection::Visits])?;
        Ok(self.store.data().visits.get(&id).cloned())
    }

    async fn exists(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Visits])?;
        Ok(self.store.data().visits.contains_key(&id))
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<bool> {
        self.store.check(&[Collection::Visits])?;
        Ok(self.store.data().visits.remove(&id).is_some())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.store.check(&[Collection::Visits])?;
        Ok(self.store.data().visits.len() as i64)
    }

    async fn clear(&self) -> RepositoryResult<u64> {
        self.store.check(&[Collection::Visits])?;
        let mut data = self.store.data();
        let removed = data.visits.len() as u64;
        data.visits.clear();
        Ok(removed)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        self.store.check(&[Collection::Visits])
    }
}

#[async_trait]
impl VisitRepository for MemoryVisitRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Visit>> {
        self.filtered(|_| true)
    }

    async fn find_by_pet(&self, pet: ObjectId) -> RepositoryResult<Vec<Visit>> {
        self.filtered(|v| v.pet_id() == pet)
    }

    async fn find_by_pets(&self, pets: &[ObjectId]) -> RepositoryResult<Vec<Visit>> {
        self.filtered(|v| pets.contains(&v.pet_id()))
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Visit>> {
        self.filtered(|v| v.date >= start && v.date < end)
    }

    async fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<Visit>> {
        let mut visits = self.filtered(|_| true)?;
        visits.truncate(limit);
        Ok(visits)
    }

    async fn insert(&self, visit: &Visit) -> RepositoryResult<()> {
        self.store.check(&[Collection::Visits])?;
        self.store.data().visits.insert(visit.id, visit.clone());
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &VisitPatch) -> RepositoryResult<Option<Visit>> {
        self.store.check(&[Collection::Visits])?;
        let mut data = self.store.data();
        Ok(data.visits.get_mut(&id).map(|visit| {
            visit.apply(patch.clone());
            visit.clone()
        }))
    }
}

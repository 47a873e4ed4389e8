//! Test utilities for vetclinic
//!
//! Fixture builders and a ready-made service set over the in-memory store.
//! Tests that need a failing backend call
//! [`InMemoryStore::fail_collection`] on the returned store.

use crate::config::{Config, DashboardConfig, DatabaseConfig, ServerConfig};
use crate::db::{InMemoryStore, Repositories};
use crate::models::{ObjectId, OwnerPayload, PetPayload, VeterinarianPayload, VisitPayload};
use crate::services::Services;

/// Configuration for tests: in-memory storage, non-production environment
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 2000,
            log_level: "debug".to_string(),
            environment: "test".to_string(),
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            backend: "memory".to_string(),
            url: String::new(),
            pool_max_size: 1,
            pool_min_idle: 0,
            pool_timeout_seconds: 1,
            pool_idle_timeout_seconds: 1,
            run_migrations: false,
        },
        dashboard: DashboardConfig::default(),
    }
}

/// Services over a fresh in-memory store, plus the store for failure injection
pub fn test_services() -> (Services, InMemoryStore) {
    let store = InMemoryStore::new();
    let repos = Repositories::in_memory(&store);
    let services = Services::new(repos, &DashboardConfig::default())
        .expect("default dashboard locale is supported");
    (services, store)
}

/// Owner creation payload with the three required fields
pub fn owner_payload(first_name: &str, last_name: &str, telephone: &str) -> OwnerPayload {
    OwnerPayload {
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        telephone: Some(telephone.to_string()),
        ..Default::default()
    }
}

/// Pet creation payload
pub fn pet_payload(name: &str, species: &str, owner: ObjectId) -> PetPayload {
    PetPayload {
        name: Some(name.to_string()),
        species: Some(species.to_string()),
        owner: Some(owner.to_string()),
        ..Default::default()
    }
}

pub fn veterinarian_payload(
    first_name: &str,
    last_name: &str,
    specialties: &[&str],
) -> VeterinarianPayload {
    VeterinarianPayload {
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        specialties: Some(specialties.iter().map(|s| s.to_string()).collect()),
    }
}

/// Visit creation payload dated `date` (RFC 3339 or `YYYY-MM-DD`), or now when `None`
pub fn visit_payload(
    description: &str,
    pet: ObjectId,
    veterinarian: Option<ObjectId>,
    date: Option<&str>,
) -> VisitPayload {
    VisitPayload {
        date: date.map(str::to_string),
        description: Some(description.to_string()),
        pet: Some(pet.to_string()),
        veterinarian: veterinarian.map(|v| Some(v.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixtures_build_a_clinic() {
        let (services, _store) = test_services();

        let owner = services
            .create_owner(owner_payload("Jean", "Coleman", "6085552654"))
            .await
            .unwrap();
        let pet = services
            .create_pet(pet_payload("Max", "cat", owner.id))
            .await
            .unwrap();
        let vet = services
            .create_veterinarian(veterinarian_payload("Helen", "Leary", &["radiology"]))
            .await
            .unwrap();
        let visit = services
            .create_visit(visit_payload("rabies shot", pet.id, Some(vet.id), None))
            .await
            .unwrap();

        assert_eq!(visit.pet_owner, owner.id);
        assert_eq!(visit.visit.veterinarian_id(), Some(vet.id));
    }

    #[test]
    fn test_config_is_valid() {
        test_config().validate().unwrap();
    }
}

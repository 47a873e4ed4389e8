//! Integration tests for the typed clinic client
//!
//! Each test serves the router on an ephemeral local port and talks to it
//! through [`ClinicClient`].

use std::sync::Arc;
use tokio::net::TcpListener;
use vetclinic::{
    api::server::create_router,
    client::{ClientError, ClinicClient},
    models::{PetPayload, Species, VisitPayload},
    test_utils::{owner_payload, test_config, test_services, veterinarian_payload},
};

async fn spawn_server() -> ClinicClient {
    let (services, _store) = test_services();
    let app = create_router(Arc::new(test_config()), services);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ClinicClient::new(format!("http://{}/api", addr))
}

fn pet(name: &str, species: &str, owner: &str) -> PetPayload {
    PetPayload {
        name: Some(name.into()),
        species: Some(species.into()),
        owner: Some(owner.into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_owner_round_trip() {
    let client = spawn_server().await;

    let created = client
        .create_owner(&owner_payload("Jean", "Coleman", "6085552654"))
        .await
        .unwrap();
    let fetched = client.get_owner(&created.id.to_string()).await.unwrap();

    assert_eq!(fetched.owner, created);
    assert!(fetched.pets.is_empty());

    let found = client.search_owners("cole").await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(client.search_owners("xyz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_owners_with_pet_counts() {
    let client = spawn_server().await;

    let jean = client
        .create_owner(&owner_payload("Jean", "Coleman", "6085552654"))
        .await
        .unwrap();
    client
        .create_owner(&owner_payload("Harold", "Davis", "6085553198"))
        .await
        .unwrap();
    let jean_id = jean.id.to_string();
    client.create_pet(&pet("Max", "cat", &jean_id)).await.unwrap();
    client.create_pet(&pet("Samantha", "cat", &jean_id)).await.unwrap();

    let owners = client.owners_with_pet_counts().await.unwrap();
    assert_eq!(owners.len(), 2);
    assert_eq!(owners[0].owner.last_name, "Coleman");
    assert_eq!(owners[0].pet_count, 2);
    assert!(owners[0].has_pets);
    assert_eq!(owners[1].pet_count, 0);
    assert!(!owners[1].has_pets);
}

#[tokio::test]
async fn test_not_found_surfaces_as_api_error() {
    let client = spawn_server().await;
    let err = client
        .get_pet("aaaaaaaaaaaaaaaaaaaaaaaa")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(matches!(err, ClientError::Api { body, .. } if body.contains("Pet not found")));
}

#[tokio::test]
async fn test_visit_flow_and_dashboard() {
    let client = spawn_server().await;

    let owner = client
        .create_owner(&owner_payload("Jean", "Coleman", "6085552654"))
        .await
        .unwrap();
    let max = client
        .create_pet(&pet("Max", "cat", &owner.id.to_string()))
        .await
        .unwrap();
    let vet = client
        .create_veterinarian(&veterinarian_payload("Helen", "Leary", &["radiology"]))
        .await
        .unwrap();

    let created = client
        .create_visit(&VisitPayload {
            description: Some("rabies shot".into()),
            pet: Some(max.id.to_string()),
            veterinarian: Some(Some(vet.id.to_string())),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.pet_owner, owner.id);

    let visits = client.visits_by_pet(&max.id.to_string()).await.unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].veterinarian_id(), Some(vet.id));

    let summary = client.dashboard_summary().await.unwrap();
    assert_eq!(summary.visit_count, 1);
    assert_eq!(summary.pet_types.get(&Species::Cat), Some(&1));

    let report = client.monthly_visits().await.unwrap();
    assert_eq!(report.months.len(), 12);
    assert_eq!(report.total(), 1);

    let outcome = client.delete_owner(&owner.id.to_string()).await.unwrap();
    assert_eq!(outcome.deleted_pets, Some(1));
    assert_eq!(outcome.deleted_visits, Some(1));
    assert!(client.list_visits().await.unwrap().is_empty());
    assert_eq!(client.list_veterinarians().await.unwrap().len(), 1);
}

//! Service-level integration tests for vetclinic
//!
//! These tests exercise the clinic operations directly over the in-memory
//! store, including behavior under injected store failures.

use chrono::{TimeZone, Utc};
use vetclinic::{
    db::{seed, Collection},
    models::{OwnerPayload, PetPayload, Ref, Species, VisitPayload},
    test_utils::{owner_payload, pet_payload, test_services, veterinarian_payload, visit_payload},
    Error, ObjectId,
};

#[tokio::test]
async fn test_owners_sorted_by_last_then_first_name() {
    let (services, _store) = test_services();
    for (first, last) in [("Peter", "McTavish"), ("Betty", "Davis"), ("Harold", "Davis")] {
        services
            .create_owner(owner_payload(first, last, "0600000000"))
            .await
            .unwrap();
    }

    let owners = services.list_owners(None).await.unwrap();
    let names: Vec<(&str, &str)> = owners
        .iter()
        .map(|o| (o.last_name.as_str(), o.first_name.as_str()))
        .collect();

    assert_eq!(
        names,
        vec![("Davis", "Betty"), ("Davis", "Harold"), ("McTavish", "Peter")]
    );
}

#[tokio::test]
async fn test_blank_filter_lists_everyone() {
    let (services, _store) = test_services();
    services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();

    assert_eq!(services.list_owners(Some("   ")).await.unwrap().len(), 1);
    assert!(services.list_owners(Some("zz")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_owner_detail_nests_pets_and_visits() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let pet = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();
    services
        .create_visit(visit_payload("checkup", pet.id, None, Some("2024-06-01")))
        .await
        .unwrap();

    let detail = services.get_owner(&owner.id.to_string()).await.unwrap();
    assert_eq!(detail.owner.id, owner.id);
    assert_eq!(detail.pets.len(), 1);
    assert_eq!(detail.pets[0].visits.len(), 1);
    assert_eq!(detail.pets[0].visits[0].description, "checkup");
}

#[tokio::test]
async fn test_owner_update_ignores_absent_fields() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();

    let updated = services
        .update_owner(
            &owner.id.to_string(),
            OwnerPayload {
                telephone: Some("0611111111".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.telephone, "0611111111");
    assert_eq!(updated.first_name, "Jean");
    assert!(updated.updated_at >= owner.updated_at);
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let (services, _store) = test_services();
    let id = ObjectId::new().to_string();

    assert!(matches!(services.get_owner(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(services.get_pet(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(services.get_veterinarian(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(services.get_visit(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(services.delete_owner(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(services.delete_visit(&id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let (services, _store) = test_services();

    assert!(matches!(services.get_owner("nope").await, Err(Error::InvalidId { .. })));
    assert!(matches!(
        services.list_pets_by_owner("123").await,
        Err(Error::InvalidId { .. })
    ));
    assert!(matches!(
        services.list_visits_by_pet("").await,
        Err(Error::InvalidId { .. })
    ));
}

#[tokio::test]
async fn test_pet_owner_change_requires_existing_owner() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let pet = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();

    let result = services
        .update_pet(
            &pet.id.to_string(),
            PetPayload {
                owner: Some(ObjectId::new().to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::NotFound(msg)) if msg == "Owner not found"));

    let unchanged = services.get_pet(&pet.id.to_string()).await.unwrap();
    assert_eq!(unchanged.pet.owner_id(), owner.id);
}

#[tokio::test]
async fn test_pet_delete_cascades_to_visits() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let max = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();
    let rex = services
        .create_pet(pet_payload("Rex", "dog", owner.id))
        .await
        .unwrap();
    for pet in [max.id, max.id, rex.id] {
        services
            .create_visit(visit_payload("checkup", pet, None, None))
            .await
            .unwrap();
    }

    let outcome = services.delete_pet(&max.id.to_string()).await.unwrap();
    assert_eq!(outcome.message, "Pet removed");
    assert_eq!(outcome.deleted_visits, Some(2));

    let remaining = services.list_visits().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].pet_id(), rex.id);
}

#[tokio::test]
async fn test_owner_delete_cascades_to_every_pet_and_visit() {
    const PETS: usize = 2;
    const VISITS_PER_PET: usize = 2;

    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let neighbour = services
        .create_owner(owner_payload("Betty", "Davis", "0600000001"))
        .await
        .unwrap();
    let kept_pet = services
        .create_pet(pet_payload("Basil", "rabbit", neighbour.id))
        .await
        .unwrap();
    services
        .create_visit(visit_payload("checkup", kept_pet.id, None, None))
        .await
        .unwrap();

    let mut pet_ids = Vec::new();
    let mut visit_ids = Vec::new();
    for i in 0..PETS {
        let pet = services
            .create_pet(pet_payload(&format!("Pet {}", i), "cat", owner.id))
            .await
            .unwrap();
        for _ in 0..VISITS_PER_PET {
            let created = services
                .create_visit(visit_payload("vaccination", pet.id, None, None))
                .await
                .unwrap();
            visit_ids.push(created.visit.id);
        }
        pet_ids.push(pet.id);
    }

    let outcome = services.delete_owner(&owner.id.to_string()).await.unwrap();
    assert_eq!(outcome.deleted_pets, Some(PETS as u64));
    assert_eq!(outcome.deleted_visits, Some((PETS * VISITS_PER_PET) as u64));

    for pet_id in &pet_ids {
        assert!(services
            .list_visits_by_pet(&pet_id.to_string())
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            services.get_pet(&pet_id.to_string()).await,
            Err(Error::NotFound(_))
        ));
    }
    for visit_id in &visit_ids {
        assert!(matches!(
            services.get_visit(&visit_id.to_string()).await,
            Err(Error::NotFound(_))
        ));
    }

    let remaining = services.list_visits().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].pet_id(), kept_pet.id);
}

#[tokio::test]
async fn test_visit_requires_existing_pet() {
    let (services, _store) = test_services();
    let result = services
        .create_visit(visit_payload("checkup", ObjectId::new(), None, None))
        .await;

    assert!(matches!(result, Err(Error::NotFound(msg)) if msg == "Pet not found"));
}

#[tokio::test]
async fn test_visits_are_newest_first_and_dangling_vet_is_null() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let pet = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();
    let vet = services
        .create_veterinarian(veterinarian_payload("Helen", "Leary", &[]))
        .await
        .unwrap();

    services
        .create_visit(visit_payload("older", pet.id, Some(vet.id), Some("2024-01-10")))
        .await
        .unwrap();
    services
        .create_visit(visit_payload("newer", pet.id, Some(vet.id), Some("2024-03-10")))
        .await
        .unwrap();

    services
        .delete_veterinarian(&vet.id.to_string())
        .await
        .unwrap();

    let visits = services
        .list_visits_by_pet(&pet.id.to_string())
        .await
        .unwrap();
    assert_eq!(visits[0].description, "newer");
    assert_eq!(visits[1].description, "older");
    assert!(visits.iter().all(|v| v.veterinarian.is_none()));
}

#[tokio::test]
async fn test_visit_listing_resolves_pet_and_vet() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let pet = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();
    let vet = services
        .create_veterinarian(veterinarian_payload("Helen", "Leary", &["surgery"]))
        .await
        .unwrap();
    services
        .create_visit(visit_payload("checkup", pet.id, Some(vet.id), None))
        .await
        .unwrap();

    let visits = services.list_visits().await.unwrap();
    let visit = &visits[0];
    assert!(matches!(&visit.pet, Ref::Resolved(p) if p.name == "Max"));
    assert!(matches!(
        visit.veterinarian.as_ref(),
        Some(Ref::Resolved(v)) if v.last_name == "Leary"
    ));
}

#[tokio::test]
async fn test_visit_update_moves_to_existing_pet_only() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let pet = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();
    let visit = services
        .create_visit(visit_payload("checkup", pet.id, None, None))
        .await
        .unwrap();

    let result = services
        .update_visit(
            &visit.visit.id.to_string(),
            VisitPayload {
                pet: Some(ObjectId::new().to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let updated = services
        .update_visit(
            &visit.visit.id.to_string(),
            VisitPayload {
                description: Some("follow-up".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "follow-up");
    assert_eq!(updated.pet_id(), pet.id);
}

#[tokio::test]
async fn test_dashboard_summary_counts() {
    let (services, _store) = test_services();
    seed::import_data(services.repositories(), Utc::now())
        .await
        .unwrap();

    let summary = services.dashboard_summary().await.unwrap();
    assert_eq!(summary.owner_count, 10);
    assert_eq!(summary.vet_count, 6);
    assert_eq!(summary.pet_count, 8);
    assert_eq!(summary.visit_count, 4);
    assert_eq!(summary.pet_types.values().sum::<u64>(), 8);
    assert!(summary.pet_types.values().all(|count| *count > 0));
    assert_eq!(summary.recent_visits.len(), 4);
    assert!(summary
        .recent_visits
        .windows(2)
        .all(|w| w[0].date >= w[1].date));
    assert!(summary.visit_error.is_none());
}

#[tokio::test]
async fn test_dashboard_summary_survives_visit_failure() {
    let (services, store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();

    store.fail_collection(Collection::Visits);

    let summary = services.dashboard_summary().await.unwrap();
    assert_eq!(summary.owner_count, 1);
    assert_eq!(summary.pet_count, 1);
    assert_eq!(summary.pet_types.get(&Species::Cat), Some(&1));
    assert_eq!(summary.visit_count, 0);
    assert!(summary.recent_visits.is_empty());
    assert!(summary.visit_error.is_some());

    store.fail_collection(Collection::Owners);
    assert!(services.dashboard_summary().await.is_err());
}

#[tokio::test]
async fn test_monthly_histogram_over_store() {
    let (services, _store) = test_services();
    let owner = services
        .create_owner(owner_payload("Jean", "Coleman", "0600000000"))
        .await
        .unwrap();
    let pet = services
        .create_pet(pet_payload("Max", "cat", owner.id))
        .await
        .unwrap();
    for date in ["2025-03-02", "2025-03-20", "2024-04-01", "2024-03-31"] {
        services
            .create_visit(visit_payload("checkup", pet.id, None, Some(date)))
            .await
            .unwrap();
    }

    let now = Utc.with_ymd_and_hms(2025, 3, 25, 9, 0, 0).unwrap();
    let report = services.monthly_visit_histogram(now).await;

    assert!(report.error.is_none());
    assert_eq!(report.months.len(), 12);
    assert_eq!(report.months[0].key, "2024-04");
    assert_eq!(report.months[0].count, 1);
    assert_eq!(report.months[11].key, "2025-03");
    assert_eq!(report.months[11].count, 2);
    assert_eq!(report.total(), 3);
}

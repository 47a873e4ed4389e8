//! Integration tests for vetclinic data models
//!
//! These tests verify the wire format of records and the validation of
//! client payloads end to end.

use serde_json::json;
use vetclinic::models::{
    NewOwner, NewPet, ObjectId, Owner, OwnerPayload, Pet, PetPayload, Ref, Species, Visit,
    VisitPayload,
};
use vetclinic::Error;

fn owner() -> Owner {
    Owner::create(NewOwner {
        first_name: "George".into(),
        last_name: "Franklin".into(),
        address: "110 W. Liberty St.".into(),
        city: "Madison".into(),
        telephone: "6085551023".into(),
    })
}

#[test]
fn test_owner_serializes_with_mongo_style_id() {
    let owner = owner();
    let value = serde_json::to_value(&owner).unwrap();

    assert_eq!(value["_id"], owner.id.to_string());
    assert_eq!(value["firstName"], "George");
    assert_eq!(value["telephone"], "6085551023");
    assert!(value["createdAt"].is_string());
    assert!(value.get("id").is_none());
}

#[test]
fn test_pet_owner_reference_forms() {
    let owner = owner();
    let mut pet = Pet::create(NewPet {
        name: "Leo".into(),
        species: Species::Cat,
        age: None,
        birth_date: None,
        owner: owner.id,
    });

    let value = serde_json::to_value(&pet).unwrap();
    assert_eq!(value["owner"], owner.id.to_string());
    assert_eq!(value["type"], "cat");

    pet.owner = Ref::Resolved(owner.summary());
    let value = serde_json::to_value(&pet).unwrap();
    assert_eq!(value["owner"]["lastName"], "Franklin");

    let back: Pet = serde_json::from_value(value).unwrap();
    assert!(back.owner.is_resolved());
    assert_eq!(back.owner_id(), owner.id);
}

#[test]
fn test_visit_without_veterinarian_deserializes() {
    let pet = ObjectId::new();
    let value = json!({
        "_id": ObjectId::new().to_string(),
        "date": "2024-05-02T10:00:00Z",
        "description": "checkup",
        "pet": pet.to_string(),
        "createdAt": "2024-05-02T10:00:00Z",
        "updatedAt": "2024-05-02T10:00:00Z",
    });

    let visit: Visit = serde_json::from_value(value).unwrap();
    assert_eq!(visit.pet_id(), pet);
    assert!(visit.veterinarian.is_none());
}

#[test]
fn test_owner_payload_trims_and_requires_fields() {
    let payload: OwnerPayload = serde_json::from_value(json!({
        "firstName": "  Betty ",
        "lastName": "Davis",
        "telephone": "6085551749",
    }))
    .unwrap();
    let new = payload.into_new().unwrap();
    assert_eq!(new.first_name, "Betty");
    assert_eq!(new.city, "");

    let payload: OwnerPayload = serde_json::from_value(json!({ "firstName": "" })).unwrap();
    let errors = payload.into_new().unwrap_err();
    assert!(errors.has_field("firstName"));
    assert!(errors.has_field("lastName"));
    assert!(errors.has_field("telephone"));
}

#[test]
fn test_pet_payload_accepts_french_species() {
    let payload: PetPayload = serde_json::from_value(json!({
        "name": "Rex",
        "type": "chien",
        "owner": ObjectId::new().to_string(),
    }))
    .unwrap();

    assert_eq!(payload.into_new().unwrap().species, Species::Dog);
}

#[test]
fn test_pet_payload_rejects_malformed_owner() {
    let payload: PetPayload = serde_json::from_value(json!({
        "name": "Rex",
        "type": "dog",
        "owner": "12345",
    }))
    .unwrap();

    assert!(matches!(
        payload.into_new(),
        Err(Error::InvalidId { entity: "owner", .. })
    ));
}

#[test]
fn test_visit_payload_veterinarian_states() {
    let absent: VisitPayload = serde_json::from_value(json!({})).unwrap();
    assert_eq!(absent.veterinarian, None);

    let cleared: VisitPayload = serde_json::from_value(json!({ "veterinarian": null })).unwrap();
    assert_eq!(cleared.veterinarian, Some(None));
    assert_eq!(cleared.into_patch().unwrap().veterinarian, Some(None));

    let vet = ObjectId::new();
    let set: VisitPayload =
        serde_json::from_value(json!({ "veterinarian": vet.to_string() })).unwrap();
    assert_eq!(set.into_patch().unwrap().veterinarian, Some(Some(vet)));
}

#[test]
fn test_visit_payload_rejects_bad_date() {
    let payload: VisitPayload = serde_json::from_value(json!({
        "date": "yesterday",
        "description": "checkup",
        "pet": ObjectId::new().to_string(),
    }))
    .unwrap();

    assert!(matches!(payload.into_new(), Err(Error::Validation(_))));
}

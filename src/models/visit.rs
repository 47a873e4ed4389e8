//! Visit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::error::ValidationErrorKind;
use super::id::ObjectId;
use super::pet::PetSummary;
use super::reference::{Identified, Ref};
use super::validation::{
    parse_date, parse_optional_date, require_text, require_text_if_present, rule_errors,
    validate_date, validate_object_id,
};
use super::veterinarian::VeterinarianSummary;
use crate::error::{Error, Result};

/// A dated clinic encounter for one pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub date: DateTime<Utc>,
    pub description: String,
    pub pet: Ref<PetSummary>,
    #[serde(default)]
    pub veterinarian: Option<Ref<VeterinarianSummary>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visit {
    pub fn create(new: NewVisit) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            date: new.date,
            description: new.description,
            pet: Ref::Unresolved(new.pet),
            veterinarian: new.veterinarian.map(Ref::Unresolved),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: VisitPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(pet) = patch.pet {
            self.pet = Ref::Unresolved(pet);
        }
        if let Some(veterinarian) = patch.veterinarian {
            self.veterinarian = veterinarian.map(Ref::Unresolved);
        }
        self.updated_at = Utc::now();
    }

    pub fn pet_id(&self) -> ObjectId {
        self.pet.id()
    }

    pub fn veterinarian_id(&self) -> Option<ObjectId> {
        self.veterinarian.as_ref().map(Ref::id)
    }
}

impl Identified for Visit {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// A freshly created visit, with the visited pet's owner for navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedVisit {
    #[serde(flatten)]
    pub visit: Visit,
    pub pet_owner: ObjectId,
}

/// Distinguish an absent field from an explicit `null`
fn deserialize_some<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Visit fields as sent by clients.
///
/// `veterinarian` is three-state on update: absent keeps the stored value,
/// `null` or `""` clears it, an id replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VisitPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_object_id"))]
    pub pet: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(custom(function = "validate_object_id"))]
    pub veterinarian: Option<Option<String>>,
}

fn parse_veterinarian(raw: Option<String>) -> Result<Option<ObjectId>> {
    match raw {
        Some(value) if !value.trim().is_empty() => ObjectId::parse(value.trim())
            .map(Some)
            .map_err(|_| Error::invalid_id("veterinarian", value)),
        _ => Ok(None),
    }
}

impl VisitPayload {
    /// Validate as a creation request; the date defaults to now
    pub fn into_new(self) -> Result<NewVisit> {
        // identifiers are reported on their own once every other field passes
        let mut errors = rule_errors(&self).without(&ValidationErrorKind::InvalidId);

        let description = errors.check(require_text(self.description, "description"));
        let pet = errors.check(require_text(self.pet, "pet"));
        let date = match self.date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => errors.check(parse_date(raw, "date")),
            _ => Some(Utc::now()),
        };

        let (Some(description), Some(pet), Some(date)) = (description, pet, date) else {
            return Err(errors.into());
        };
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let pet = ObjectId::parse(&pet).map_err(|_| Error::invalid_id("pet", pet))?;
        let veterinarian = parse_veterinarian(self.veterinarian.flatten())?;

        Ok(NewVisit {
            date,
            description,
            pet,
            veterinarian,
        })
    }

    /// Validate as a partial update; only supplied fields are checked
    pub fn into_patch(self) -> Result<VisitPatch> {
        let mut errors = rule_errors(&self).without(&ValidationErrorKind::InvalidId);

        let description = errors
            .check(require_text_if_present(self.description, "description"))
            .flatten();
        let pet = errors
            .check(require_text_if_present(self.pet, "pet"))
            .flatten();
        let date = errors
            .check(parse_optional_date(self.date.as_deref(), "date"))
            .flatten();

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let pet = pet
            .map(|raw| ObjectId::parse(&raw).map_err(|_| Error::invalid_id("pet", raw)))
            .transpose()?;
        let veterinarian = self.veterinarian.map(parse_veterinarian).transpose()?;

        Ok(VisitPatch {
            date,
            description,
            pet,
            veterinarian,
        })
    }
}

/// Validated visit ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub date: DateTime<Utc>,
    pub description: String,
    pub pet: ObjectId,
    pub veterinarian: Option<ObjectId>,
}

/// Validated partial update.
///
/// `veterinarian: Some(None)` clears the reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitPatch {
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub pet: Option<ObjectId>,
    pub veterinarian: Option<Option<ObjectId>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PET: &str = "507f1f77bcf86cd799439011";
    const VET: &str = "507f1f77bcf86cd799439012";

    #[test]
    fn test_into_new_defaults_date() {
        let before = Utc::now();
        let new = VisitPayload {
            description: Some("rabies shot".into()),
            pet: Some(PET.into()),
            ..Default::default()
        }
        .into_new()
        .unwrap();

        assert!(new.date >= before);
        assert!(new.veterinarian.is_none());
    }

    #[test]
    fn test_into_new_requires_description_and_pet() {
        match VisitPayload::default().into_new() {
            Err(Error::Validation(errors)) => {
                assert!(errors.has_field("description"));
                assert!(errors.has_field("pet"));
            },
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_new_checks_id_formats() {
        let bad_pet = VisitPayload {
            description: Some("checkup".into()),
            pet: Some("123".into()),
            ..Default::default()
        }
        .into_new();
        assert!(matches!(bad_pet, Err(Error::InvalidId { entity: "pet", .. })));

        let bad_vet = VisitPayload {
            description: Some("checkup".into()),
            pet: Some(PET.into()),
            veterinarian: Some(Some("xyz".into())),
            ..Default::default()
        }
        .into_new();
        assert!(matches!(
            bad_vet,
            Err(Error::InvalidId {
                entity: "veterinarian",
                ..
            })
        ));
    }

    #[test]
    fn test_veterinarian_three_states() {
        let absent: VisitPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.veterinarian, None);

        let null: VisitPayload = serde_json::from_value(json!({ "veterinarian": null })).unwrap();
        assert_eq!(null.veterinarian, Some(None));
        assert_eq!(null.into_patch().unwrap().veterinarian, Some(None));

        let blank: VisitPayload = serde_json::from_value(json!({ "veterinarian": "" })).unwrap();
        assert_eq!(blank.into_patch().unwrap().veterinarian, Some(None));

        let set: VisitPayload = serde_json::from_value(json!({ "veterinarian": VET })).unwrap();
        let patch = set.into_patch().unwrap();
        assert_eq!(patch.veterinarian, Some(Some(ObjectId::parse(VET).unwrap())));
    }

    #[test]
    fn test_absent_veterinarian_serializes_as_null() {
        let visit = Visit::create(NewVisit {
            date: Utc::now(),
            description: "checkup".into(),
            pet: ObjectId::parse(PET).unwrap(),
            veterinarian: None,
        });
        let value = serde_json::to_value(&visit).unwrap();

        assert_eq!(value["veterinarian"], json!(null));
        assert_eq!(value["pet"], PET);
    }

    #[test]
    fn test_apply_clears_veterinarian() {
        let mut visit = Visit::create(NewVisit {
            date: Utc::now(),
            description: "spayed".into(),
            pet: ObjectId::parse(PET).unwrap(),
            veterinarian: Some(ObjectId::parse(VET).unwrap()),
        });

        visit.apply(VisitPatch {
            veterinarian: Some(None),
            ..Default::default()
        });

        assert!(visit.veterinarian_id().is_none());
        assert_eq!(visit.description, "spayed");
    }
}

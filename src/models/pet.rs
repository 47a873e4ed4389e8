//! Pet records and species tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::{ValidationError, ValidationErrorKind, ValidationResult};
use super::id::ObjectId;
use super::owner::OwnerSummary;
use super::reference::{Identified, Ref};
use super::validation::{
    parse_optional_date, require_text, require_text_if_present, rule_errors, validate_age,
    validate_date, validate_object_id, validate_species,
};
use super::visit::Visit;
use crate::error::{Error, Result};

/// Species supported by the clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    #[serde(alias = "chien")]
    Dog,
    #[serde(alias = "chat")]
    Cat,
    #[serde(alias = "oiseau")]
    Bird,
    #[serde(alias = "lapin")]
    Rabbit,
    #[serde(alias = "rongeur")]
    Rodent,
    Reptile,
    #[serde(alias = "autre")]
    Other,
}

impl Species {
    pub const ALL: [Species; 7] = [
        Species::Dog,
        Species::Cat,
        Species::Bird,
        Species::Rabbit,
        Species::Rodent,
        Species::Reptile,
        Species::Other,
    ];

    /// Parse a species tag, case-insensitive, French tags included
    pub fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "dog" | "chien" => Ok(Species::Dog),
            "cat" | "chat" => Ok(Species::Cat),
            "bird" | "oiseau" => Ok(Species::Bird),
            "rabbit" | "lapin" => Ok(Species::Rabbit),
            "rodent" | "rongeur" => Ok(Species::Rodent),
            "reptile" => Ok(Species::Reptile),
            "other" | "autre" => Ok(Species::Other),
            _ => Err(ValidationError::with_context(
                ValidationErrorKind::InvalidSpecies,
                "type",
                format!("Unknown pet type: {}", s),
            )),
        }
    }

    /// Convert to the canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Bird => "bird",
            Species::Rabbit => "rabbit",
            Species::Rodent => "rodent",
            Species::Reptile => "reptile",
            Species::Other => "other",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An animal belonging to one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub species: Species,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<DateTime<Utc>>,
    pub owner: Ref<OwnerSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pet {
    /// Build a fresh record from validated input
    pub fn create(new: NewPet) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            name: new.name,
            species: new.species,
            age: new.age,
            birth_date: new.birth_date,
            owner: Ref::Unresolved(new.owner),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the supplied fields of a partial update
    pub fn apply(&mut self, patch: PetPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(species) = patch.species {
            self.species = species;
        }
        if patch.age.is_some() {
            self.age = patch.age;
        }
        if patch.birth_date.is_some() {
            self.birth_date = patch.birth_date;
        }
        if let Some(owner) = patch.owner {
            self.owner = Ref::Unresolved(owner);
        }
        self.updated_at = Utc::now();
    }

    pub fn owner_id(&self) -> ObjectId {
        self.owner.id()
    }

    pub fn summary(&self) -> PetSummary {
        PetSummary {
            id: self.id,
            name: self.name.clone(),
            species: self.species,
        }
    }
}

impl Identified for Pet {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// The slice of a pet embedded in visit listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub species: Species,
}

impl Identified for PetSummary {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// A pet together with its visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetDetail {
    #[serde(flatten)]
    pub pet: Pet,
    pub visits: Vec<Visit>,
}

/// Pet fields as sent by clients, for both create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PetPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_species"))]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_date"))]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_object_id"))]
    pub owner: Option<String>,
}

impl PetPayload {
    /// Validate as a creation request.
    ///
    /// Field errors are reported together; a malformed owner id is only
    /// reported once every other field is valid.
    pub fn into_new(self) -> Result<NewPet> {
        let mut errors = rule_errors(&self).without(&ValidationErrorKind::InvalidId);

        let name = errors.check(require_text(self.name, "name"));
        let species = match self.species.as_deref() {
            Some(tag) if !tag.trim().is_empty() => errors.check(Species::from_str(tag)),
            _ => {
                errors.add(ValidationError::new(ValidationErrorKind::RequiredField, "type"));
                None
            },
        };
        let age = errors.check(validate_age(self.age, "age")).flatten();
        let birth_date = errors
            .check(parse_optional_date(self.birth_date.as_deref(), "birthDate"))
            .flatten();
        let owner = errors.check(require_text(self.owner, "owner"));

        let (Some(name), Some(species), Some(owner)) = (name, species, owner) else {
            return Err(errors.into());
        };
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let owner = ObjectId::parse(&owner).map_err(|_| Error::invalid_id("owner", owner))?;

        Ok(NewPet {
            name,
            species,
            age,
            birth_date,
            owner,
        })
    }

    /// Validate as a partial update; only supplied fields are checked
    pub fn into_patch(self) -> Result<PetPatch> {
        let mut errors = rule_errors(&self).without(&ValidationErrorKind::InvalidId);

        let name = errors
            .check(require_text_if_present(self.name, "name"))
            .flatten();
        let species = match self.species.as_deref() {
            Some(tag) => errors.check(Species::from_str(tag)),
            None => None,
        };
        let age = errors.check(validate_age(self.age, "age")).flatten();
        let birth_date = errors
            .check(parse_optional_date(self.birth_date.as_deref(), "birthDate"))
            .flatten();
        let owner = errors
            .check(require_text_if_present(self.owner, "owner"))
            .flatten();

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let owner = owner
            .map(|raw| ObjectId::parse(&raw).map_err(|_| Error::invalid_id("owner", raw)))
            .transpose()?;

        Ok(PetPatch {
            name,
            species,
            age,
            birth_date,
            owner,
        })
    }
}

/// Validated pet ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewPet {
    pub name: String,
    pub species: Species,
    pub age: Option<i32>,
    pub birth_date: Option<DateTime<Utc>>,
    pub owner: ObjectId,
}

/// Validated partial update; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetPatch {
    pub name: Option<String>,
    pub species: Option<Species>,
    pub age: Option<i32>,
    pub birth_date: Option<DateTime<Utc>>,
    pub owner: Option<ObjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> PetPayload {
        PetPayload {
            name: Some("Leo".into()),
            species: Some("dog".into()),
            age: Some(3),
            birth_date: None,
            owner: Some("507f1f77bcf86cd799439011".into()),
        }
    }

    #[test]
    fn test_species_tags_and_aliases() {
        assert_eq!(Species::from_str("Dog").unwrap(), Species::Dog);
        assert_eq!(Species::from_str("chat").unwrap(), Species::Cat);
        assert_eq!(Species::from_str("rongeur").unwrap(), Species::Rodent);
        assert!(Species::from_str("dragon").is_err());

        for species in Species::ALL {
            assert_eq!(Species::from_str(species.as_str()).unwrap(), species);
        }

        let parsed: Species = serde_json::from_value(json!("oiseau")).unwrap();
        assert_eq!(parsed, Species::Bird);
        assert_eq!(serde_json::to_value(Species::Rabbit).unwrap(), json!("rabbit"));
    }

    #[test]
    fn test_into_new() {
        let new = payload().into_new().unwrap();
        assert_eq!(new.name, "Leo");
        assert_eq!(new.species, Species::Dog);
        assert_eq!(new.owner.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_into_new_batches_field_errors() {
        let result = PetPayload {
            name: None,
            species: Some("dragon".into()),
            age: Some(-2),
            birth_date: Some("yesterday".into()),
            owner: None,
        }
        .into_new();

        match result {
            Err(Error::Validation(errors)) => {
                for field in ["name", "type", "age", "birthDate", "owner"] {
                    assert!(errors.has_field(field), "missing error for {field}");
                }
            },
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_derived_rules() {
        assert!(payload().validate().is_ok());

        let invalid = PetPayload {
            name: Some(String::new()),
            species: Some("dragon".into()),
            age: Some(-1),
            birth_date: Some("24/06/2010".into()),
            owner: Some("123".into()),
        };
        let report = invalid.validate().unwrap_err();
        let fields = report.field_errors();
        assert_eq!(fields.len(), 5);
        for field in ["name", "age", "birth_date", "owner"] {
            assert!(fields.contains_key(field), "no rule fired for {field}");
        }

        match invalid.into_new() {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.len(), 4);
                assert!(errors.has_field("type"));
                assert!(errors.has_field("birthDate"));
                assert!(!errors.has_field("owner"));
            },
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_new_rejects_malformed_owner() {
        let result = PetPayload {
            owner: Some("123".into()),
            ..payload()
        }
        .into_new();

        assert!(matches!(result, Err(Error::InvalidId { entity: "owner", .. })));
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let mut new = payload().into_new().unwrap();
        new.age = None;
        let pet = Pet::create(new);
        let value = serde_json::to_value(&pet).unwrap();

        assert!(value.get("age").is_none());
        assert!(value.get("birthDate").is_none());
        assert_eq!(value["type"], "dog");
        assert_eq!(value["owner"], "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_into_patch() {
        let patch = PetPayload {
            age: Some(4),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.age, Some(4));
        assert!(patch.owner.is_none());

        let result = PetPayload {
            owner: Some("nope".into()),
            ..Default::default()
        }
        .into_patch();
        assert!(matches!(result, Err(Error::InvalidId { .. })));
    }

    #[test]
    fn test_apply_patch_changes_owner() {
        let mut pet = Pet::create(payload().into_new().unwrap());
        let new_owner = ObjectId::new();

        pet.apply(PetPatch {
            owner: Some(new_owner),
            species: Some(Species::Other),
            ..Default::default()
        });

        assert_eq!(pet.owner_id(), new_owner);
        assert_eq!(pet.species, Species::Other);
        assert_eq!(pet.age, Some(3));
    }
}

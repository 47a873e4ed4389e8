//! Veterinarian records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::ValidationErrors;
use super::id::ObjectId;
use super::reference::Identified;
use super::validation::{normalize_specialties, require_text, require_text_if_present, rule_errors};

/// A member of the clinic staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Veterinarian {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Veterinarian {
    pub fn create(new: NewVeterinarian) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            first_name: new.first_name,
            last_name: new.last_name,
            specialties: new.specialties,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: VeterinarianPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(specialties) = patch.specialties {
            self.specialties = specialties;
        }
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> VeterinarianSummary {
        VeterinarianSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

impl Identified for Veterinarian {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// The slice of a veterinarian embedded in visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VeterinarianSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
}

impl Identified for VeterinarianSummary {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// Veterinarian fields as sent by clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VeterinarianPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialties: Option<Vec<String>>,
}

impl VeterinarianPayload {
    pub fn into_new(self) -> Result<NewVeterinarian, ValidationErrors> {
        let mut errors = rule_errors(&self);

        let first_name = errors.check(require_text(self.first_name, "firstName"));
        let last_name = errors.check(require_text(self.last_name, "lastName"));

        match (first_name, last_name) {
            (Some(first_name), Some(last_name)) if errors.is_empty() => Ok(NewVeterinarian {
                first_name,
                last_name,
                specialties: normalize_specialties(self.specialties.unwrap_or_default()),
            }),
            _ => Err(errors),
        }
    }

    pub fn into_patch(self) -> Result<VeterinarianPatch, ValidationErrors> {
        let mut errors = rule_errors(&self);

        let patch = VeterinarianPatch {
            first_name: errors
                .check(require_text_if_present(self.first_name, "firstName"))
                .flatten(),
            last_name: errors
                .check(require_text_if_present(self.last_name, "lastName"))
                .flatten(),
            specialties: self.specialties.map(normalize_specialties),
        };

        errors.into_result(patch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVeterinarian {
    pub first_name: String,
    pub last_name: String,
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VeterinarianPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialties: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_new_normalizes_specialties() {
        let new = VeterinarianPayload {
            first_name: Some("Linda".into()),
            last_name: Some("Douglas".into()),
            specialties: Some(vec!["dentistry".into(), " ".into(), "surgery".into(), "dentistry".into()]),
        }
        .into_new()
        .unwrap();

        assert_eq!(new.specialties, vec!["dentistry", "surgery"]);
    }

    #[test]
    fn test_into_new_requires_names() {
        let errors = VeterinarianPayload::default().into_new().unwrap_err();
        assert!(errors.has_field("firstName"));
        assert!(errors.has_field("lastName"));
    }

    #[test]
    fn test_specialties_default_to_empty() {
        let vet = Veterinarian::create(
            VeterinarianPayload {
                first_name: Some("James".into()),
                last_name: Some("Carter".into()),
                specialties: None,
            }
            .into_new()
            .unwrap(),
        );
        assert!(vet.specialties.is_empty());

        let value = serde_json::to_value(&vet).unwrap();
        assert_eq!(value["specialties"], serde_json::json!([]));
    }

    #[test]
    fn test_patch_replaces_specialties() {
        let mut vet = Veterinarian::create(NewVeterinarian {
            first_name: "Helen".into(),
            last_name: "Leary".into(),
            specialties: vec!["radiology".into()],
        });

        let patch = VeterinarianPayload {
            specialties: Some(vec!["surgery".into()]),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        vet.apply(patch);

        assert_eq!(vet.specialties, vec!["surgery"]);
        assert_eq!(vet.last_name, "Leary");
    }
}

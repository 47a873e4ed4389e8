//! Owner records
//!
//! An owner is a clinic customer. Pets point back to their owner; the owner
//! record itself holds no list of pets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::ValidationErrors;
use super::id::ObjectId;
use super::pet::PetDetail;
use super::reference::Identified;
use super::validation::{optional_text, require_text, require_text_if_present, rule_errors};

/// A clinic customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    pub telephone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owner {
    /// Build a fresh record from validated input
    pub fn create(new: NewOwner) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            first_name: new.first_name,
            last_name: new.last_name,
            address: new.address,
            city: new.city,
            telephone: new.telephone,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the supplied fields of a partial update
    pub fn apply(&mut self, patch: OwnerPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(telephone) = patch.telephone {
            self.telephone = telephone;
        }
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> OwnerSummary {
        OwnerSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

impl Identified for Owner {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// The slice of an owner embedded in pet listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
}

impl Identified for OwnerSummary {
    fn id(&self) -> ObjectId {
        self.id
    }
}

/// An owner together with their pets, each carrying its visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerDetail {
    #[serde(flatten)]
    pub owner: Owner,
    pub pets: Vec<PetDetail>,
}

/// Owner fields as sent by clients, for both create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub telephone: Option<String>,
}

impl OwnerPayload {
    /// Validate as a creation request
    pub fn into_new(self) -> Result<NewOwner, ValidationErrors> {
        let mut errors = rule_errors(&self);

        let first_name = errors.check(require_text(self.first_name, "firstName"));
        let last_name = errors.check(require_text(self.last_name, "lastName"));
        let telephone = errors.check(require_text(self.telephone, "telephone"));

        match (first_name, last_name, telephone) {
            (Some(first_name), Some(last_name), Some(telephone)) if errors.is_empty() => {
                Ok(NewOwner {
                    first_name,
                    last_name,
                    address: optional_text(self.address).unwrap_or_default(),
                    city: optional_text(self.city).unwrap_or_default(),
                    telephone,
                })
            },
            _ => Err(errors),
        }
    }

    /// Validate as a partial update; only supplied fields are checked
    pub fn into_patch(self) -> Result<OwnerPatch, ValidationErrors> {
        let mut errors = rule_errors(&self);

        let patch = OwnerPatch {
            first_name: errors
                .check(require_text_if_present(self.first_name, "firstName"))
                .flatten(),
            last_name: errors
                .check(require_text_if_present(self.last_name, "lastName"))
                .flatten(),
            address: optional_text(self.address),
            city: optional_text(self.city),
            telephone: errors
                .check(require_text_if_present(self.telephone, "telephone"))
                .flatten(),
        };

        errors.into_result(patch)
    }
}

/// Validated owner ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub telephone: String,
}

/// Validated partial update; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub telephone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(first: Option<&str>, last: Option<&str>, tel: Option<&str>) -> OwnerPayload {
        OwnerPayload {
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            telephone: tel.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_into_new_defaults_address_and_city() {
        let new = payload(Some("Jean"), Some("Coleman"), Some("6085552654"))
            .into_new()
            .unwrap();

        assert_eq!(new.first_name, "Jean");
        assert_eq!(new.address, "");
        assert_eq!(new.city, "");
    }

    #[test]
    fn test_into_new_reports_every_missing_field() {
        let errors = payload(None, Some("  "), None).into_new().unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("firstName"));
        assert!(errors.has_field("lastName"));
        assert!(errors.has_field("telephone"));
    }

    #[test]
    fn test_into_patch_checks_supplied_fields_only() {
        let patch = payload(None, None, Some("555")).into_patch().unwrap();
        assert_eq!(patch.telephone.as_deref(), Some("555"));
        assert!(patch.first_name.is_none());

        let errors = payload(Some(""), None, None).into_patch().unwrap_err();
        assert!(errors.has_field("firstName"));
    }

    #[test]
    fn test_apply_patch() {
        let mut owner = Owner::create(
            payload(Some("Betty"), Some("Davis"), Some("6085551749"))
                .into_new()
                .unwrap(),
        );
        let created = owner.updated_at;

        owner.apply(OwnerPatch {
            city: Some("Sun Prairie".into()),
            ..Default::default()
        });

        assert_eq!(owner.city, "Sun Prairie");
        assert_eq!(owner.first_name, "Betty");
        assert!(owner.updated_at >= created);
    }

    #[test]
    fn test_wire_shape() {
        let owner = Owner::create(
            payload(Some("George"), Some("Franklin"), Some("6085551023"))
                .into_new()
                .unwrap(),
        );
        let value = serde_json::to_value(&owner).unwrap();

        assert_eq!(value["_id"], json!(owner.id.to_string()));
        assert_eq!(value["firstName"], "George");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("first_name").is_none());
    }
}

//! Dashboard aggregates

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pet::Species;
use super::visit::Visit;

/// Visit count for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub key: String,
    /// Localized label, e.g. `janv. 2025`
    pub month: String,
    pub count: u64,
}

/// Trailing twelve-month visit histogram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyVisitReport {
    pub months: Vec<MonthlyBucket>,
    /// Set when visits could not be loaded; `months` is then empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MonthlyVisitReport {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            months: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn total(&self) -> u64 {
        self.months.iter().map(|m| m.count).sum()
    }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub owner_count: u64,
    pub pet_count: u64,
    pub vet_count: u64,
    pub visit_count: u64,
    /// Pets per species; species without pets are left out
    pub pet_types: BTreeMap<Species, u64>,
    /// Most recent visits, pet and veterinarian resolved
    pub recent_visits: Vec<Visit>,
    /// Set when the visit figures could not be loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_error: Option<String>,
}

/// Confirmation returned by deletions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_pets: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_visits: Option<u64>,
}

impl DeleteOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            deleted_pets: None,
            deleted_visits: None,
        }
    }

    pub fn with_pets(mut self, count: u64) -> Self {
        self.deleted_pets = Some(count);
        self
    }

    pub fn with_visits(mut self, count: u64) -> Self {
        self.deleted_visits = Some(count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_report_shape() {
        let value = serde_json::to_value(MonthlyVisitReport::failed("visits unavailable")).unwrap();
        assert_eq!(value, json!({ "months": [], "error": "visits unavailable" }));
    }

    #[test]
    fn test_summary_pet_types_keyed_by_tag() {
        let mut summary = DashboardSummary::default();
        summary.pet_types.insert(Species::Cat, 3);
        summary.pet_types.insert(Species::Dog, 2);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["petTypes"], json!({ "dog": 2, "cat": 3 }));
        assert!(value.get("visitError").is_none());
    }

    #[test]
    fn test_delete_outcome_omits_unset_counts() {
        let value = serde_json::to_value(DeleteOutcome::new("Visit removed")).unwrap();
        assert_eq!(value, json!({ "message": "Visit removed" }));

        let value =
            serde_json::to_value(DeleteOutcome::new("Owner removed").with_pets(2).with_visits(5))
                .unwrap();
        assert_eq!(value["deletedPets"], 2);
        assert_eq!(value["deletedVisits"], 5);
    }
}

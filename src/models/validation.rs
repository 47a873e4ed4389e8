//! Field validation rules shared by every clinic record
//!
//! Payload conversions, services and the typed client all go through these
//! functions so that a rule only exists in one place.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;
use validator::Validate;

use super::error::{ValidationError, ValidationErrorKind, ValidationErrors, ValidationResult};
use super::pet::Species;

static OBJECT_ID_REGEX: OnceLock<Regex> = OnceLock::new();

/// Get or initialize the identifier regex pattern
fn object_id_regex() -> &'static Regex {
    OBJECT_ID_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{24}$").expect("Invalid identifier regex pattern")
    })
}

/// Whether `value` has the shape of a record identifier
pub fn is_valid_object_id(value: &str) -> bool {
    object_id_regex().is_match(value)
}

fn rule_error(code: &'static str, message: String) -> validator::ValidationError {
    let mut error = validator::ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Identifier rule for the validator derive; blank values are left to the
/// required-field check
pub fn validate_object_id(value: &str) -> Result<(), validator::ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_valid_object_id(trimmed) {
        Ok(())
    } else {
        Err(rule_error("invalid_id", format!("Invalid identifier: {}", trimmed)))
    }
}

/// Species rule for the validator derive
pub fn validate_species(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    Species::from_str(value)
        .map(|_| ())
        .map_err(|e| rule_error("invalid_species", e.message()))
}

/// Date rule for the validator derive; blank dates count as absent
pub fn validate_date(value: &str) -> Result<(), validator::ValidationError> {
    parse_optional_date(Some(value), "date")
        .map(|_| ())
        .map_err(|e| rule_error("invalid_date", e.message()))
}

/// Run the derived rules of `payload`, keyed by wire field name
pub fn rule_errors<T: Validate>(payload: &T) -> ValidationErrors {
    match payload.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(report) => report.into(),
    }
}

/// Validate a required text field, returning the trimmed value
pub fn require_text(value: Option<String>, field_name: &str) -> ValidationResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ValidationError::new(
            ValidationErrorKind::RequiredField,
            field_name,
        )),
    }
}

/// Validate a required text field on a partial update.
///
/// Absent fields are left alone; supplied fields must not be blank.
pub fn require_text_if_present(
    value: Option<String>,
    field_name: &str,
) -> ValidationResult<Option<String>> {
    match value {
        None => Ok(None),
        some => require_text(some, field_name).map(Some),
    }
}

/// Trim an optional free-text field
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Validate that an optional age is non-negative
pub fn validate_age(age: Option<i32>, field_name: &str) -> ValidationResult<Option<i32>> {
    match age {
        Some(value) if value < 0 => Err(ValidationError::with_context(
            ValidationErrorKind::NegativeAge,
            field_name,
            format!("Age cannot be negative, got: {}", value),
        )),
        _ => Ok(age),
    }
}

/// Parse a date supplied either as RFC3339 or as a plain `YYYY-MM-DD` day
pub fn parse_date(value: &str, field_name: &str) -> ValidationResult<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ValidationError::with_context(
                ValidationErrorKind::InvalidDate,
                field_name,
                format!("Invalid date: {}", trimmed),
            )
        })
}

/// Parse an optional date field; blank strings count as absent
pub fn parse_optional_date(
    value: Option<&str>,
    field_name: &str,
) -> ValidationResult<Option<DateTime<Utc>>> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_date(v, field_name).map(Some),
        _ => Ok(None),
    }
}

/// Trim specialty tags, drop blanks and duplicates while keeping order
pub fn normalize_specialties(specialties: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(specialties.len());
    for tag in specialties {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE patterns
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_object_id_shape() {
        assert!(is_valid_object_id("507f1f77bcf86cd799439011"));
        assert!(is_valid_object_id("507F1F77BCF86CD799439011"));

        let invalid = vec![
            "",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "507f1f77bcf86cd79943901z",
            "not-an-id",
        ];
        for id in invalid {
            assert!(!is_valid_object_id(id), "{id} should be rejected");
        }
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Some(" Jean ".into()), "firstName").unwrap(), "Jean");
        assert!(require_text(Some("   ".into()), "firstName").is_err());
        assert!(require_text(None, "firstName").is_err());

        let err = require_text(None, "telephone").unwrap_err();
        assert_eq!(err.field, "telephone");
        assert_eq!(err.kind, ValidationErrorKind::RequiredField);
    }

    #[test]
    fn test_require_text_if_present() {
        assert_eq!(require_text_if_present(None, "name").unwrap(), None);
        assert_eq!(
            require_text_if_present(Some("Leo".into()), "name").unwrap(),
            Some("Leo".to_string())
        );
        assert!(require_text_if_present(Some(String::new()), "name").is_err());
    }

    #[test]
    fn test_validate_age() {
        assert_eq!(validate_age(Some(3), "age").unwrap(), Some(3));
        assert_eq!(validate_age(Some(0), "age").unwrap(), Some(0));
        assert_eq!(validate_age(None, "age").unwrap(), None);
        assert!(validate_age(Some(-1), "age").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let day = parse_date("2010-06-24", "birthDate").unwrap();
        assert_eq!((day.year(), day.month(), day.day()), (2010, 6, 24));
        assert_eq!(day.hour(), 0);

        let ts = parse_date("2024-03-05T10:30:00+02:00", "date").unwrap();
        assert_eq!(ts.hour(), 8);

        assert!(parse_date("24/06/2010", "birthDate").is_err());
        assert!(parse_date("", "birthDate").is_err());
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date(None, "birthDate").unwrap(), None);
        assert_eq!(parse_optional_date(Some("  "), "birthDate").unwrap(), None);
        assert!(parse_optional_date(Some("2012-06-08"), "birthDate").unwrap().is_some());
        assert!(parse_optional_date(Some("soon"), "birthDate").is_err());
    }

    #[test]
    fn test_normalize_specialties() {
        let tags = vec![
            " surgery ".to_string(),
            "".to_string(),
            "dentistry".to_string(),
            "surgery".to_string(),
        ];
        assert_eq!(normalize_specialties(tags), vec!["surgery", "dentistry"]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("Davis"), "Davis");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_validator_rules() {
        assert!(validate_object_id("507f1f77bcf86cd799439011").is_ok());
        assert!(validate_object_id("").is_ok());
        assert_eq!(validate_object_id("123").unwrap_err().code, "invalid_id");

        assert!(validate_species("Chat").is_ok());
        assert_eq!(validate_species("dragon").unwrap_err().code, "invalid_species");

        assert!(validate_date("2010-06-24").is_ok());
        assert!(validate_date(" ").is_ok());
        let err = validate_date("yesterday").unwrap_err();
        assert_eq!(err.code, "invalid_date");
        assert_eq!(err.message.as_deref(), Some("Invalid date: yesterday"));
    }
}

//! Validation error types for clinic records
//!
//! This module defines error types specifically for field validation,
//! separate from the general application errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single field that failed validation
#[derive(Error, Debug, Clone)]
pub struct ValidationError {
    /// The kind of validation error
    pub kind: ValidationErrorKind,
    /// The field that failed validation (wire name, e.g. `firstName`)
    pub field: String,
    /// Optional additional context
    pub context: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ValidationErrorKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            context: None,
        }
    }

    /// Create a validation error with additional context
    pub fn with_context(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            context: Some(context.into()),
        }
    }

    /// Message shown to API consumers for this field
    pub fn message(&self) -> String {
        match &self.context {
            Some(ctx) => ctx.clone(),
            None => self.kind.to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(
                f,
                "Validation failed for field '{}': {} - {}",
                self.field, self.kind, ctx
            ),
            None => write!(
                f,
                "Validation failed for field '{}': {}",
                self.field, self.kind
            ),
        }
    }
}

/// Specific validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Malformed record identifier
    #[error("Invalid identifier (expected 24 hexadecimal characters)")]
    InvalidId,

    /// Unknown species tag
    #[error("Invalid pet type (expected: dog, cat, bird, rabbit, rodent, reptile or other)")]
    InvalidSpecies,

    /// Unparseable date
    #[error("Invalid date (expected RFC3339 or YYYY-MM-DD)")]
    InvalidDate,

    /// Age below zero
    #[error("Age cannot be negative")]
    NegativeAge,

    /// Field is required but missing or blank
    #[error("Required field is missing")]
    RequiredField,

    /// Custom validation error
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Wire shape of one failed field: `{ "param": ..., "msg": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
}

/// Collection of validation errors
#[derive(Debug, Default, Clone)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error; a field keeps only its first failure
    pub fn add(&mut self, error: ValidationError) {
        if !self.has_field(&error.field) {
            self.errors.push(error);
        }
    }

    /// Drop every failure of `kind`
    pub fn without(mut self, kind: &ValidationErrorKind) -> Self {
        self.errors.retain(|e| &e.kind != kind);
        self
    }

    /// Record the error of `result`, if any, and hand back its value
    pub fn check<T>(&mut self, result: ValidationResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(e);
                None
            },
        }
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Whether `field` is among the failed fields
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Per-field view used in API error bodies
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors
            .iter()
            .map(|e| FieldError {
                param: e.field.clone(),
                msg: e.message(),
            })
            .collect()
    }

    /// Convert to a Result
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else {
            write!(f, "Validation failed with {} error(s):", self.errors.len())?;
            for error in &self.errors {
                write!(f, "\n  - {}", error)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}

/// Wire name of a payload field: camelCase, with `species` sent as `type`
fn wire_name(field: &str) -> String {
    if field == "species" {
        return "type".to_string();
    }
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

fn rule_kind(code: &str) -> ValidationErrorKind {
    match code {
        "length" | "required" => ValidationErrorKind::RequiredField,
        "range" => ValidationErrorKind::NegativeAge,
        "invalid_id" => ValidationErrorKind::InvalidId,
        "invalid_species" => ValidationErrorKind::InvalidSpecies,
        "invalid_date" => ValidationErrorKind::InvalidDate,
        other => ValidationErrorKind::Custom(other.to_string()),
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(report: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = report.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let mut errors = Self::new();
        for (field, failures) in fields {
            for failure in failures {
                errors.add(ValidationError {
                    kind: rule_kind(&failure.code),
                    field: wire_name(field),
                    context: failure.message.as_ref().map(|m| m.to_string()),
                });
            }
        }
        errors
    }
}

/// Convert validation errors to application errors
impl From<ValidationError> for crate::error::Error {
    fn from(err: ValidationError) -> Self {
        crate::error::Error::Validation(err.into())
    }
}

impl From<ValidationErrors> for crate::error::Error {
    fn from(err: ValidationErrors) -> Self {
        crate::error::Error::Validation(err)
    }
}

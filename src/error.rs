//! Error handling module for vetclinic
//!
//! This module defines the error types used throughout the application,
//! providing a unified error handling strategy with proper error context
//! and HTTP response mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::ValidationErrors;

/// Result type alias for vetclinic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Debug details of a 5xx error, carried as a response extension.
///
/// The router decides whether they reach the client as a `stack` field.
#[derive(Debug, Clone)]
pub struct InternalDetails {
    pub error: String,
    pub stack: String,
}

/// Main error type for vetclinic
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(String),

    /// Malformed identifier, detected before any lookup
    #[error("Invalid {entity} id")]
    InvalidId {
        /// Kind of record the id was meant to address
        entity: &'static str,
        /// The rejected input
        value: String,
    },

    /// One or more fields failed validation
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Request body could not be decoded
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// Not found errors
    #[error("{0}")]
    NotFound(String),

    /// Known path, unsupported method
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a database error
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Error::Database(msg.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_id<S: Into<String>>(entity: &'static str, value: S) -> Self {
        Error::InvalidId {
            entity,
            value: value.into(),
        }
    }

    /// Create a not found error, e.g. `Error::not_found("Owner")`
    pub fn not_found(entity: &str) -> Self {
        Error::NotFound(format!("{} not found", entity))
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidId { .. } | Error::Validation(_) | Error::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            },
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::Config(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client
    pub fn body(&self) -> Value {
        match self {
            Error::InvalidId { value, .. } => json!({
                "error": self.to_string(),
                "details": format!("'{}' is not a 24-character hexadecimal identifier", value),
            }),
            Error::Validation(errors) => json!({ "errors": errors.field_errors() }),
            Error::MalformedBody(details) => json!({
                "error": "Malformed request body",
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

/// Implement IntoResponse for automatic error responses in Axum
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.body());

        // Log error based on severity
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = ?self, "Internal server error");
                let details = InternalDetails {
                    error: self.to_string(),
                    stack: format!("{:?}", self),
                };
                (status, axum::Extension(details), body).into_response()
            },
            _ => {
                tracing::warn!(error = %self, status = status.as_u16(), "Client error");
                (status, body).into_response()
            },
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::MalformedBody(rejection.body_text())
    }
}

/// Convert from envconfig::Error to our Error type
impl From<envconfig::Error> for Error {
    fn from(err: envconfig::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Database(format!("Migration failed: {}", err))
    }
}

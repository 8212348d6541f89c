//! Error types for the campus admin dashboard

use std::{error::Error as StdError, fmt};

/// Main error type for dashboard-side logic
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// No schema is registered under this slug
    UnknownEntity {
        /// The slug that was requested
        slug: String,
    },

    /// The entity does not expose the requested operation
    UnsupportedOperation {
        /// Entity slug
        entity: String,
        /// Operation name (create, update, detail, delete)
        operation: &'static str,
    },

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::UnknownEntity { slug } => write!(f, "Unknown entity: {slug}"),
            Self::UnsupportedOperation { entity, operation } => {
                write!(f, "Entity {entity} does not support {operation}")
            }
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = first_field_error(&errors)
            .unwrap_or_else(|| ("unknown".to_string(), errors.to_string()));

        Self::Validation { field, message }
    }
}

// Nested config sections report their errors one level down.
fn first_field_error(errors: &validator::ValidationErrors) -> Option<(String, String)> {
    use validator::ValidationErrorsKind;

    errors.errors().iter().find_map(|(field, kind)| match kind {
        ValidationErrorsKind::Field(errs) => {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(ToString::to_string))
                .unwrap_or_else(|| "is invalid".to_string());
            Some((field.to_string(), message))
        }
        ValidationErrorsKind::Struct(inner) => first_field_error(inner),
        ValidationErrorsKind::List(items) => items.values().find_map(|e| first_field_error(e)),
    })
}

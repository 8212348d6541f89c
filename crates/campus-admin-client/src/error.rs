//! Error types for backend calls

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for backend calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the REST backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response
    #[error("Failed to reach backend during {operation}: {source}")]
    Transport {
        /// What was being attempted
        operation: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// The backend rejected the bearer token
    #[error("Session is no longer valid")]
    Unauthorized,

    /// The record or endpoint does not exist
    #[error("Not found: {path}")]
    NotFound {
        /// Backend path that returned 404
        path: String,
    },

    /// Any other non-success status; the body is kept verbatim for display
    #[error("Backend returned {status}: {body}")]
    Rejected {
        /// HTTP status
        status: StatusCode,
        /// Raw response body
        body: String,
    },

    /// A success response did not have the expected shape
    #[error("Unexpected response from {path}: {message}")]
    Decode {
        /// Backend path
        path: String,
        /// What went wrong
        message: String,
    },

    /// Dashboard-side error (schema, form validation)
    #[error(transparent)]
    Core(#[from] campus_admin_core::Error),

    /// No token is stored for this browser session
    #[error("Not signed in")]
    MissingToken,
}

impl ClientError {
    /// Whether this error must end the session
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::MissingToken)
    }

    /// Whether this is a 404
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the request failed before any response
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Text shown to the user for a failed write
    ///
    /// Rejections show the backend's body verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { body, .. } if !body.trim().is_empty() => body.clone(),
            Self::Rejected { status, .. } => format!("Request failed with status {status}"),
            other => other.to_string(),
        }
    }
}

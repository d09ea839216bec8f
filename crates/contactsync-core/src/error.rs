//! Error types for the contact synchronization layer
//!
//! This module defines all error types used throughout the crate.
//! Operation boundaries (`SessionManager`, `ContactCollection`) convert
//! these into [`Outcome`](crate::Outcome)s; they never escape to the
//! presentation layer as faults.

use thiserror::Error;

use crate::validation::FieldErrors;

/// Result type alias for contact synchronization operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the contact client
#[derive(Error, Debug)]
pub enum Error {
    /// Local, field-keyed validation failure (never sent over the wire)
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Backend answered with a non-success status
    #[error("Remote error ({status}): {message}")]
    Remote {
        /// HTTP status code returned by the backend
        status: u16,
        /// Backend-supplied message, or the status reason
        message: String,
    },

    /// Backend rejected (or we never held) the bearer credential
    #[error("Authorization rejected: {0}")]
    Authorization(String),

    /// No response was received from the backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credential store errors
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a remote error
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a credential store error
    pub fn credential_store(msg: impl Into<String>) -> Self {
        Self::CredentialStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is an authorization rejection
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    /// Message suitable for a user-facing notification
    ///
    /// Backend messages are passed through verbatim; everything else
    /// falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Remote { message, .. } if !message.is_empty() => message.clone(),
            Self::Authorization(_) => "Your session has expired. Please log in again.".to_string(),
            Self::Validation(errors) => errors.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

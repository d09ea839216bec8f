//! Result of a user-triggered operation
//!
//! Every mutating operation of the session and contact layers reports
//! through an [`Outcome`]: a success flag, a short title and description
//! for the notification the presentation layer shows, per-field validation
//! errors when the input was rejected locally, and an optional payload.

use crate::error::Error;
use crate::validation::FieldErrors;

/// Outcome of a session or contact operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T = ()> {
    /// Whether the operation succeeded
    pub ok: bool,
    /// Short notification title
    pub title: String,
    /// Notification description
    pub message: String,
    /// Per-field validation errors (only set when input was rejected locally)
    pub field_errors: Option<FieldErrors>,
    /// Value produced by a successful operation
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    /// A successful outcome without payload
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            title: title.into(),
            message: message.into(),
            field_errors: None,
            value: None,
        }
    }

    /// A failed outcome
    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            title: title.into(),
            message: message.into(),
            field_errors: None,
            value: None,
        }
    }

    /// A failed outcome built from an error, using `fallback` when the
    /// error carries no backend message
    pub fn from_error(title: impl Into<String>, error: &Error, fallback: &str) -> Self {
        match error {
            Error::Validation(errors) => Self::invalid(errors.clone()),
            _ => Self::failure(title, error.user_message(fallback)),
        }
    }

    /// Input rejected before any network call
    pub fn invalid(errors: FieldErrors) -> Self {
        Self {
            ok: false,
            title: "Invalid contact".to_string(),
            message: "Please correct the highlighted fields.".to_string(),
            field_errors: Some(errors),
            value: None,
        }
    }

    /// Attach a payload
    pub fn with_value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Whether the failure was a local validation rejection
    pub fn is_invalid(&self) -> bool {
        self.field_errors.is_some()
    }

    /// Take the payload, if any
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

//! Wire and domain types shared by the session and contact layers
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

/// A persisted contact as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Backend-assigned identifier (never generated client-side)
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Set by the backend only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Set by the backend only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Contact {
    /// Check the collection invariant: id, name, email and phone are all non-empty
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty()
            && !self.name.is_empty()
            && !self.email.is_empty()
            && !self.phone.is_empty()
    }

    /// Search predicate
    ///
    /// Name and email match case-insensitively; phone is a plain
    /// substring match. `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str, raw: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
            || self.phone.contains(raw)
    }
}

/// The unpersisted shape used while composing a new contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// The draft as it goes on the wire: surrounding whitespace removed
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

impl From<&Contact> for ContactDraft {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}

/// A partial draft for updates; absent fields are left untouched by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ContactPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Same as [`ContactDraft::trimmed`] for the fields present
    pub fn trimmed(self) -> Self {
        let trim = |field: Option<String>| field.map(|v| v.trim().to_string());
        Self {
            name: trim(self.name),
            email: trim(self.email),
            phone: trim(self.phone),
        }
    }

    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

impl From<ContactDraft> for ContactPatch {
    fn from(draft: ContactDraft) -> Self {
        Self {
            name: Some(draft.name),
            email: Some(draft.email),
            phone: Some(draft.phone),
        }
    }
}

/// The authenticated user's identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Body of `POST /api/users/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/users/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Response of `POST /api/users/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer token
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"<REDACTED>")
            .field("user", &self.user)
            .finish()
    }
}

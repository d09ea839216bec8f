//! Configuration types for the contact client
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Name of the slot the bearer token is persisted under
pub const DEFAULT_CREDENTIAL_SLOT: &str = "contactsphere_token";

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL (e.g. "https://api.contactsphere.com")
    pub base_url: String,

    /// Where the bearer credential is persisted
    #[serde(default)]
    pub credential_store: CredentialStoreConfig,

    /// Slot name inside the credential store
    #[serde(default = "default_credential_slot")]
    pub credential_slot: String,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl ClientConfig {
    /// Create a configuration for `base_url` with defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential_store: CredentialStoreConfig::default(),
            credential_slot: default_credential_slot(),
            http: HttpConfig::default(),
        }
    }

    /// Persist the credential to a file
    pub fn with_credential_file(mut self, path: impl Into<String>) -> Self {
        self.credential_store = CredentialStoreConfig::File { path: path.into() };
        self
    }

    /// Use a different credential slot
    pub fn with_credential_slot(mut self, slot: impl Into<String>) -> Self {
        self.credential_slot = slot.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(crate::Error::config("Base URL cannot be empty"));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Base URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }
        if self.credential_slot.trim().is_empty() {
            return Err(crate::Error::config("Credential slot cannot be empty"));
        }

        self.credential_store.validate()?;
        self.http.validate()?;

        Ok(())
    }

    /// Base URL without trailing slashes
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialStoreConfig {
    /// File-based credential store
    File {
        /// Path to the credential file
        path: String,
    },

    /// In-memory credential store (forgotten on exit)
    #[default]
    Memory,
}

impl CredentialStoreConfig {
    /// Validate the credential store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CredentialStoreConfig::File { path } if path.trim().is_empty() => Err(
                crate::Error::config("Credential file path cannot be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            CredentialStoreConfig::File { .. } => "file",
            CredentialStoreConfig::Memory => "memory",
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    ///
    /// `None` leaves the transport's default behavior in place.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    /// Validate the HTTP configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.request_timeout_secs == Some(0) {
            return Err(crate::Error::config("HTTP request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_credential_slot() -> String {
    DEFAULT_CREDENTIAL_SLOT.to_string()
}

fn default_user_agent() -> String {
    concat!("contactsync/", env!("CARGO_PKG_VERSION")).to_string()
}

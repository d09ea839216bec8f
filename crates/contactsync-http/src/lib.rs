// # HTTP Contact Transport
//
// This crate provides the reqwest-based `ContactApi` implementation that
// talks to the ContactSphere REST backend.
//
// ## Behavior
//
// - One HTTP request per call, no retries, no caching
// - Stateless: the bearer credential is passed in by `RemoteClient` on every
//   authenticated call and never stored here
// - Optional request timeout from `HttpConfig` (transport default otherwise)
//
// ## Status Mapping
//
// - 2xx: success, body parsed as JSON where a value is expected
// - 401: `Error::Authorization` (the session layer tears down)
// - other: `Error::Remote` with the body's `message` field, or the
//   canonical status reason
// - no response: `Error::Transport`
//
// ## Security Requirements
//
// - The credential NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - POST `/api/users/register`, POST `/api/users/login`, GET `/api/users/current`
// - GET/POST `/api/contacts`
// - GET/PUT/DELETE `/api/contacts/{id}`

use std::time::Duration;

use async_trait::async_trait;
use contactsync_core::config::{ClientConfig, HttpConfig};
use contactsync_core::model::{
    AuthResponse, Contact, ContactDraft, ContactPatch, LoginRequest, RegisterRequest, User,
};
use contactsync_core::traits::ContactApi;
use contactsync_core::{Error, Result};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

/// Error body shape returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// REST transport for the contact backend
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpContactApi {
    base_url: Url,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpContactApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContactApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpContactApi {
    /// Create a transport for `base_url` with default HTTP settings
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http_config(base_url, &HttpConfig::default())
    }

    /// Create a transport for `base_url` with explicit HTTP settings
    pub fn with_http_config(base_url: &str, http: &HttpConfig) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| Error::config(format!("Invalid base URL {}: {}", trimmed, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Base URL must use HTTP or HTTPS scheme. Got: {}",
                base_url.scheme()
            )));
        }

        let mut builder = reqwest::Client::builder().user_agent(http.user_agent.clone());
        if let Some(secs) = http.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Create a transport from a validated client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::with_http_config(config.normalized_base_url(), &config.http)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build the URL for `segments` below the base URL
    ///
    /// Segments are percent-encoded, so ids are always a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("Base URL cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and map the status
    async fn execute(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("{} request failed: {}", operation, e)))?;

        let status = response.status();
        trace!("{} -> {}", operation, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body))
    }

    /// Send a request and parse the JSON body
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<T> {
        let response = self.execute(request, operation).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("{} response could not be read: {}", operation, e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Map a non-success status and its body to an error
fn map_status(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED => Error::authorization(message),
        _ => Error::remote(status.as_u16(), message),
    }
}

#[async_trait]
impl ContactApi for HttpContactApi {
    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        let url = self.endpoint(&["api", "users", "register"])?;
        debug!("POST {}", url);
        self.execute(self.client.post(url).json(request), "register")
            .await
            .map(|_| ())
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let url = self.endpoint(&["api", "users", "login"])?;
        debug!("POST {}", url);
        self.fetch(self.client.post(url).json(request), "login").await
    }

    async fn current_user(&self, credential: &str) -> Result<User> {
        let url = self.endpoint(&["api", "users", "current"])?;
        debug!("GET {}", url);
        self.fetch(self.client.get(url).bearer_auth(credential), "current_user")
            .await
    }

    async fn list_contacts(&self, credential: &str) -> Result<Vec<Contact>> {
        let url = self.endpoint(&["api", "contacts"])?;
        debug!("GET {}", url);
        self.fetch(self.client.get(url).bearer_auth(credential), "list_contacts")
            .await
    }

    async fn get_contact(&self, credential: &str, id: &str) -> Result<Contact> {
        let url = self.endpoint(&["api", "contacts", id])?;
        debug!("GET {}", url);
        self.fetch(self.client.get(url).bearer_auth(credential), "get_contact")
            .await
    }

    async fn create_contact(&self, credential: &str, draft: &ContactDraft) -> Result<Contact> {
        let url = self.endpoint(&["api", "contacts"])?;
        debug!("POST {}", url);
        self.fetch(
            self.client.post(url).bearer_auth(credential).json(draft),
            "create_contact",
        )
        .await
    }

    async fn update_contact(&self, credential: &str, id: &str, patch: &ContactPatch) -> Result<Contact> {
        let url = self.endpoint(&["api", "contacts", id])?;
        debug!("PUT {}", url);
        self.fetch(
            self.client.put(url).bearer_auth(credential).json(patch),
            "update_contact",
        )
        .await
    }

    async fn delete_contact(&self, credential: &str, id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "contacts", id])?;
        debug!("DELETE {}", url);
        self.execute(self.client.delete(url).bearer_auth(credential), "delete_contact")
            .await
            .map(|_| ())
    }

    fn api_name(&self) -> &'static str {
        "http"
    }
}

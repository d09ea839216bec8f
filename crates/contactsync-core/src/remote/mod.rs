//! Remote service client
//!
//! [`RemoteClient`] sits between the operation layers and the
//! [`ContactApi`] transport:
//!
//! - Reads the bearer credential from the injected [`Session`] for every
//!   authenticated call (everything except register and login).
//! - Applies the authorization-rejection policy in one place: whichever
//!   call is rejected, the session it was sent under is torn down
//!   (persisted slot cleared, credential and user dropped, state →
//!   `Unauthenticated`). Observers of the session state route back to the
//!   login view.
//!
//! Errors are returned unchanged to the caller after the policy ran.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{AuthResponse, Contact, ContactDraft, ContactPatch, LoginRequest, RegisterRequest, User};
use crate::session::Session;
use crate::traits::ContactApi;

/// Authenticated gateway to the contact backend
#[derive(Clone)]
pub struct RemoteClient {
    api: Arc<dyn ContactApi>,
    session: Session,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("api", &self.api.api_name())
            .field("session", &self.session)
            .finish()
    }
}

impl RemoteClient {
    pub fn new(api: Arc<dyn ContactApi>, session: Session) -> Self {
        Self { api, session }
    }

    /// The session whose credential this client attaches
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        debug!("register via {}", self.api.api_name());
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api.register(&request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        debug!("login via {}", self.api.api_name());
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api.login(&request).await
    }

    pub async fn get_current_user(&self) -> Result<User> {
        self.authorized("get_current_user", |api, token| async move {
            api.current_user(&token).await
        })
        .await
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.authorized("list_contacts", |api, token| async move {
            api.list_contacts(&token).await
        })
        .await
    }

    pub async fn get_contact(&self, id: &str) -> Result<Contact> {
        self.authorized("get_contact", |api, token| async move {
            api.get_contact(&token, id).await
        })
        .await
    }

    pub async fn create_contact(&self, draft: &ContactDraft) -> Result<Contact> {
        self.authorized("create_contact", |api, token| async move {
            api.create_contact(&token, draft).await
        })
        .await
    }

    pub async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<Contact> {
        self.authorized("update_contact", |api, token| async move {
            api.update_contact(&token, id, patch).await
        })
        .await
    }

    pub async fn delete_contact(&self, id: &str) -> Result<()> {
        self.authorized("delete_contact", |api, token| async move {
            api.delete_contact(&token, id).await
        })
        .await
    }

    /// Run an authenticated call and apply the rejection policy
    ///
    /// A rejection only ends the session the call was issued under; if a
    /// newer login replaced it meanwhile, the error is returned and nothing
    /// else happens.
    async fn authorized<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn ContactApi>, String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!("{} via {}", operation, self.api.api_name());

        let (credential, generation) = self.session.credential_at().await;
        let result = match credential {
            Some(token) => call(Arc::clone(&self.api), token).await,
            None => Err(Error::authorization("no credential held")),
        };

        if let Err(e) = &result
            && e.is_authorization()
        {
            // The storage failure (if any) is already logged by the session
            match self.session.teardown_if(generation).await {
                Ok(false) => debug!("{} rejected for a session that already ended", operation),
                _ => warn!("{} rejected by backend ({}); session torn down", operation, e),
            }
        }

        result
    }
}

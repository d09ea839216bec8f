//! Client facade
//!
//! [`ContactClient`] wires a configuration, a credential store and a
//! [`ContactApi`] transport into one [`Session`], a [`SessionManager`]
//! and a [`ContactCollection`] that all share it.

use std::sync::Arc;

use tracing::{debug, info};

use crate::collection::ContactCollection;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::User;
use crate::outcome::Outcome;
use crate::remote::RemoteClient;
use crate::session::{Session, SessionManager, SessionState};
use crate::state::open_credential_store;
use crate::traits::{ContactApi, CredentialStore};

/// Entry point for applications
///
/// # Example
///
/// ```rust,ignore
/// let config = ClientConfig::new("http://localhost:5000");
/// let api = Arc::new(HttpContactApi::from_config(&config)?);
/// let client = ContactClient::open(config, api).await?;
///
/// if client.bootstrap().await == SessionState::Authenticated {
///     client.contacts().refresh().await;
/// }
/// ```
#[derive(Debug)]
pub struct ContactClient {
    sessions: SessionManager,
    contacts: ContactCollection,
}

impl ContactClient {
    /// Validate `config`, open its credential store and build the client
    pub async fn open(config: ClientConfig, api: Arc<dyn ContactApi>) -> Result<Self> {
        config.validate()?;

        debug!(
            "Opening client for {} ({} credential store)",
            config.normalized_base_url(),
            config.credential_store.type_name()
        );
        let store = open_credential_store(&config.credential_store).await?;

        Ok(Self::with_store(api, store, config.credential_slot))
    }

    /// Build a client around an existing credential store
    pub fn with_store(
        api: Arc<dyn ContactApi>,
        store: Box<dyn CredentialStore>,
        slot: impl Into<String>,
    ) -> Self {
        let session = Session::new(store, slot);
        let remote = RemoteClient::new(api, session);

        Self {
            sessions: SessionManager::new(remote.clone()),
            contacts: ContactCollection::new(remote),
        }
    }

    pub fn session(&self) -> &Session {
        self.sessions.session()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn contacts(&self) -> &ContactCollection {
        &self.contacts
    }

    /// Resolve the startup session state
    pub async fn bootstrap(&self) -> SessionState {
        let state = self.sessions.bootstrap().await;
        info!("Session bootstrap finished: {:?}", state);
        if state != SessionState::Authenticated {
            self.contacts.reset().await;
        }
        state
    }

    /// Log in; the collection starts empty for the new user
    ///
    /// A failed login that ended the previous session clears its contacts
    /// as well.
    pub async fn login(&self, email: &str, password: &str) -> Outcome<User> {
        let outcome = self.sessions.login(email, password).await;
        if outcome.ok || !self.sessions.is_authenticated() {
            self.contacts.reset().await;
        }
        outcome
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Outcome {
        self.sessions.register(username, email, password).await
    }

    /// Flush the credential store before exit
    pub async fn close(&self) -> Result<()> {
        debug!("Closing client");
        self.session().flush().await
    }

    /// Log out and forget the previous user's contacts
    pub async fn logout(&self) -> Outcome {
        let outcome = self.sessions.logout().await;
        self.contacts.reset().await;
        outcome
    }
}

//! Session state and credential ownership
//!
//! [`Session`] is the single owner of the bearer credential and the
//! current-user identity. It is shared (cheaply cloned) between the
//! [`RemoteClient`](crate::RemoteClient), which reads the credential on
//! every authenticated call, and the [`SessionManager`], which drives the
//! login lifecycle. Nothing outside this module writes the credential.
//!
//! ## State Machine
//!
//! ```text
//!  Unknown ──bootstrap──► Unauthenticated ──login──► Authenticating
//!     │                         ▲                        │
//!     │ (stored token verified) │ logout / rejection     ▼
//!     └────────────────────────►┴───────────────── Authenticated
//! ```
//!
//! State changes are published on a `tokio::sync::watch` channel so the
//! presentation layer can route on them. Every credential change also bumps
//! a generation counter; late results from an older generation are not
//! allowed to touch the current session.

mod manager;

pub use manager::SessionManager;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, RwLockWriteGuard, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::model::User;
use crate::traits::{CredentialRecord, CredentialStore};

/// Observable authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Startup; the stored credential has not been checked yet
    Unknown,
    /// No valid credential is held
    Unauthenticated,
    /// A login call is in flight
    Authenticating,
    /// A verified credential and its user are held
    Authenticated,
}

impl SessionState {
    /// Whether bootstrap has finished deciding
    pub fn is_known(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }
}

#[derive(Default)]
struct Identity {
    credential: Option<String>,
    user: Option<User>,
}

struct SessionInner {
    slot: String,
    store: Box<dyn CredentialStore>,
    identity: RwLock<Identity>,
    /// Bumped whenever the held credential changes
    generation: AtomicU64,
    state: watch::Sender<SessionState>,
}

/// Shared handle to the client session
///
/// Clones refer to the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("slot", &self.inner.slot)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session backed by `store`, persisting the token under `slot`
    ///
    /// The session starts in [`SessionState::Unknown`]; call
    /// [`SessionManager::bootstrap`] to resolve it.
    pub fn new(store: Box<dyn CredentialStore>, slot: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            inner: Arc::new(SessionInner {
                slot: slot.into(),
                store,
                identity: RwLock::new(Identity::default()),
                generation: AtomicU64::new(0),
                state,
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Whether a verified credential and user are held
    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// State changes as a stream, starting with the current state
    pub fn watch_state(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.subscribe())
    }

    /// The authenticated user, if any
    pub async fn current_user(&self) -> Option<User> {
        self.inner.identity.read().await.user.clone()
    }

    /// The credential attached to outgoing calls, with its generation
    pub(crate) async fn credential_at(&self) -> (Option<String>, u64) {
        let identity = self.inner.identity.read().await;
        (identity.credential.clone(), self.generation())
    }

    /// Counter identifying the current credential
    ///
    /// Any result obtained under an older generation belongs to a session
    /// that no longer exists.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Whether a credential is currently attached
    pub async fn has_credential(&self) -> bool {
        self.inner.identity.read().await.credential.is_some()
    }

    /// Name of the persisted slot
    pub fn slot(&self) -> &str {
        &self.inner.slot
    }

    /// Read the persisted credential
    pub(crate) async fn load_persisted(&self) -> Result<Option<String>> {
        self.inner.store.load(&self.inner.slot).await
    }

    /// The persisted record (token plus save time), if any
    pub async fn persisted_record(&self) -> Result<Option<CredentialRecord>> {
        self.inner.store.record(&self.inner.slot).await
    }

    /// Write pending credential changes to the store
    pub async fn flush(&self) -> Result<()> {
        self.inner.store.flush().await
    }

    /// Attach a not-yet-verified credential (startup verification)
    pub(crate) async fn attach(&self, credential: String) {
        let mut identity = self.inner.identity.write().await;
        identity.credential = Some(credential);
        identity.user = None;
        self.bump();
    }

    /// Mark the attached credential as verified for `user`
    pub(crate) async fn confirm(&self, user: User) {
        {
            let mut identity = self.inner.identity.write().await;
            if identity.credential.is_none() {
                debug!("Ignoring user confirmation: credential was cleared meanwhile");
                return;
            }
            info!("Session verified for user {}", user.username);
            identity.user = Some(user);
        }
        self.set_state(SessionState::Authenticated);
    }

    /// Install a fresh credential and user, persisting the credential
    ///
    /// A persistence failure is logged; the in-memory session stays valid
    /// for the rest of the process.
    pub(crate) async fn establish(&self, credential: String, user: User) {
        {
            // Store and memory change together under the identity lock
            let mut identity = self.inner.identity.write().await;
            if let Err(e) = self.inner.store.save(&self.inner.slot, &credential).await {
                error!("Failed to persist credential: {}", e);
            }

            info!("Session established for user {}", user.username);
            identity.credential = Some(credential);
            identity.user = Some(user);
            self.bump();
        }
        self.set_state(SessionState::Authenticated);
    }

    /// Drop the credential and user everywhere and become unauthenticated
    ///
    /// Idempotent. The persisted slot is cleared first; a storage failure
    /// is reported but the in-memory session is cleared regardless.
    pub(crate) async fn teardown(&self) -> Result<()> {
        let identity = self.inner.identity.write().await;
        self.clear_locked(identity).await
    }

    /// Tear down only if the session is still at `generation`
    ///
    /// Returns `Ok(false)` when a newer credential has replaced the one the
    /// caller observed; that session is left alone.
    pub(crate) async fn teardown_if(&self, generation: u64) -> Result<bool> {
        let identity = self.inner.identity.write().await;
        if self.generation() != generation {
            debug!(
                "Skipping teardown for generation {}: session is now at {}",
                generation,
                self.generation()
            );
            return Ok(false);
        }
        self.clear_locked(identity).await.map(|()| true)
    }

    async fn clear_locked(&self, mut identity: RwLockWriteGuard<'_, Identity>) -> Result<()> {
        let cleared = self.inner.store.clear(&self.inner.slot).await;
        if let Err(e) = &cleared {
            error!("Failed to clear persisted credential: {}", e);
        }

        identity.credential = None;
        identity.user = None;
        self.bump();
        drop(identity);
        self.set_state(SessionState::Unauthenticated);

        cleared
    }

    fn bump(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            debug!("Session state: {:?} -> {:?}", previous, state);
        }
    }
}

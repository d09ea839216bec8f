// # Credential Store Trait
//
// Defines the interface for persisting the bearer credential.
//
// ## Purpose
//
// The credential store keeps the session token across process restarts.
// Absence of a token in the slot means "unauthenticated".
//
// ## Implementations
//
// - File-based: JSON file with atomic writes
// - Memory: tests and ephemeral sessions
//
// ## Usage
//
// ```rust
// use contactsync_core::{CredentialStore, MemoryCredentialStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = MemoryCredentialStore::new();
//
//     store.save("contactsphere_token", "token-value").await?;
//     let token = store.load("contactsphere_token").await?;
//     assert_eq!(token.as_deref(), Some("token-value"));
//
//     store.clear("contactsphere_token").await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// A stored credential with its bookkeeping
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct CredentialRecord {
    /// The bearer token
    pub token: String,
    /// When the token was stored
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

impl CredentialRecord {
    /// Create a new credential record stamped with the current time
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            saved_at: chrono::Utc::now(),
        }
    }

    /// Check if the record is older than the given duration
    pub fn is_older_than(&self, max_age: chrono::Duration) -> bool {
        chrono::Utc::now().signed_duration_since(self.saved_at) > max_age
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("token", &"<REDACTED>")
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Trait for credential store implementations
///
/// Slots are named so one store can be shared by several clients; the
/// contact client uses a single slot.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Responsibilities
///
/// - Async I/O only
/// - `clear()` of a missing slot is not an error
/// - Writes are durable when the method returns
/// - The store never decides whether a token is valid (owned by `SessionManager`)
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the token held in `slot`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))`: A token is stored
    /// - `Ok(None)`: The slot is empty
    /// - `Err(Error)`: Storage error
    async fn load(&self, slot: &str) -> Result<Option<String>, crate::Error>;

    /// Load the full record held in `slot`
    async fn record(&self, slot: &str) -> Result<Option<CredentialRecord>, crate::Error>;

    /// Store `token` in `slot`, replacing any previous value
    async fn save(&self, slot: &str, token: &str) -> Result<(), crate::Error>;

    /// Empty `slot`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Slot is now empty (or was already)
    /// - `Err(Error)`: Storage error
    async fn clear(&self, slot: &str) -> Result<(), crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

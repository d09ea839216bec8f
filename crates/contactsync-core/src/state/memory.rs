// # Memory Credential Store
//
// In-memory implementation of CredentialStore.
//
// ## Purpose
//
// Holds the credential for the lifetime of the process only. Useful for
// tests and for one-shot sessions where remembering the login is not
// wanted.
//
// ## Restart Behavior
//
// - The credential is lost on restart
// - The next bootstrap finds an empty slot and reports unauthenticated

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::credential_store::{CredentialRecord, CredentialStore};

/// In-memory credential store
///
/// Slots live in a HashMap protected by a RwLock. Clones share the same
/// slots.
///
/// # Example
///
/// ```rust,no_run
/// use contactsync_core::state::MemoryCredentialStore;
/// use contactsync_core::traits::CredentialStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryCredentialStore::new();
///     store.save("contactsphere_token", "abc").await?;
///     assert_eq!(store.load("contactsphere_token").await?.as_deref(), Some("abc"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl MemoryCredentialStore {
    /// Create a new empty memory credential store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of occupied slots
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if no slot is occupied
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, slot: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(slot).map(|record| record.token.clone()))
    }

    async fn record(&self, slot: &str) -> Result<Option<CredentialRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(slot).cloned())
    }

    async fn save(&self, slot: &str, token: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(slot.to_string(), CredentialRecord::new(token));
        Ok(())
    }

    async fn clear(&self, slot: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(slot);
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

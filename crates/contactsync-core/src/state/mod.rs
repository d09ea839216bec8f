// # Credential Store Implementations
//
// This module provides implementations of the CredentialStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::config::CredentialStoreConfig;
use crate::error::Result;
use crate::traits::CredentialStore;

/// Build the credential store described by `config`
pub async fn open_credential_store(config: &CredentialStoreConfig) -> Result<Box<dyn CredentialStore>> {
    match config {
        CredentialStoreConfig::File { path } => {
            tracing::debug!("Opening file credential store at {}", path);
            Ok(Box::new(FileCredentialStore::new(path).await?))
        }
        CredentialStoreConfig::Memory => {
            tracing::debug!("Using in-memory credential store");
            Ok(Box::new(MemoryCredentialStore::new()))
        }
    }
}

// # File Credential Store
//
// File-based implementation of CredentialStore with crash recovery.
//
// ## Purpose
//
// Keeps the bearer credential across client restarts so the session can be
// re-verified at startup instead of asking for a new login.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
// - Clearing a slot deletes the backup, so a removed token never comes back
//   through recovery
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "slots": {
//     "contactsphere_token": {
//       "token": "eyJhbGciOi...",
//       "saved_at": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```
//
// The file holds a secret: it is created with mode 0600 on Unix.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::credential_store::{CredentialRecord, CredentialStore};

/// Credential file format version
const CREDENTIAL_FILE_VERSION: &str = "1.0";

/// File-based credential store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use contactsync_core::state::FileCredentialStore;
/// use contactsync_core::traits::CredentialStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCredentialStore::new("/home/me/.config/contactsync/credentials.json").await?;
///     store.save("contactsphere_token", "abc").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    slots: HashMap<String, CredentialRecord>,
    dirty: bool,
}

/// Serializable credential file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CredentialFileFormat {
    version: String,
    slots: HashMap<String, CredentialRecord>,
}

impl FileCredentialStore {
    /// Create or load a file credential store
    ///
    /// This will:
    /// 1. Try to load the existing file
    /// 2. If corruption is detected, try to load from backup
    /// 3. If both fail, start with no stored credentials
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create credential directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let slots = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                slots,
                dirty: false,
            })),
        })
    }

    /// Path of the credential file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load slots from file, falling back to the backup on corruption
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, CredentialRecord>, Error> {
        match Self::load_file(path).await {
            Ok(slots) => {
                tracing::debug!("Loaded credential file: {} slot(s)", slots.len());
                Ok(slots)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Credential file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting without stored credentials.");
                    return Ok(HashMap::new());
                }

                match Self::load_file(&backup_path).await {
                    Ok(slots) => {
                        tracing::info!("Recovered credentials from backup: {} slot(s)", slots.len());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore credential file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(slots)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting without stored credentials.",
                            backup_err
                        );
                        Ok(HashMap::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load slots from a single file
    ///
    /// Parse failures surface as `Error::Json` so the caller can tell
    /// corruption apart from I/O problems.
    async fn load_file(path: &Path) -> Result<HashMap<String, CredentialRecord>, Error> {
        if !path.exists() {
            tracing::debug!("Credential file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::credential_store(format!(
                "Failed to read credential file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: CredentialFileFormat = serde_json::from_str(&content)?;

        if file.version != CREDENTIAL_FILE_VERSION {
            tracing::warn!(
                "Credential file version mismatch: expected {}, got {}. Attempting to load anyway.",
                CREDENTIAL_FILE_VERSION,
                file.version
            );
        }

        Ok(file.slots)
    }

    /// Write the current slots to disk atomically
    async fn write_file(&self) -> Result<(), Error> {
        let json = {
            let guard = self.state.read().await;
            let file = CredentialFileFormat {
                version: CREDENTIAL_FILE_VERSION.to_string(),
                slots: guard.slots.clone(),
            };
            serde_json::to_string_pretty(&file)
                .map_err(|e| Error::credential_store(format!("Failed to serialize credentials: {}", e)))?
        };

        let temp_path = self.temp_path();
        {
            let mut file = Self::create_private(&temp_path).await?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::credential_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::credential_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create credential backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::credential_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        self.state.write().await.dirty = false;

        tracing::trace!("Credential file written: {}", self.path.display());
        Ok(())
    }

    #[cfg(unix)]
    async fn create_private(path: &Path) -> Result<fs::File, Error> {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .await
            .map_err(|e| {
                Error::credential_store(format!("Failed to create temp file {}: {}", path.display(), e))
            })
    }

    #[cfg(not(unix))]
    async fn create_private(path: &Path) -> Result<fs::File, Error> {
        fs::File::create(path).await.map_err(|e| {
            Error::credential_store(format!("Failed to create temp file {}: {}", path.display(), e))
        })
    }

    /// Delete the backup so it cannot resurrect a cleared token
    async fn discard_backup(&self) -> Result<(), Error> {
        let backup_path = Self::backup_path(&self.path);
        match fs::remove_file(&backup_path).await {
            Ok(()) => {
                tracing::debug!("Removed credential backup {}", backup_path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::credential_store(format!(
                "Failed to remove credential backup {}: {}",
                backup_path.display(),
                e
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, slot: &str) -> Result<Option<String>, Error> {
        let guard = self.state.read().await;
        Ok(guard.slots.get(slot).map(|r| r.token.clone()))
    }

    async fn record(&self, slot: &str) -> Result<Option<CredentialRecord>, Error> {
        let guard = self.state.read().await;
        Ok(guard.slots.get(slot).cloned())
    }

    async fn save(&self, slot: &str, token: &str) -> Result<(), Error> {
        {
            let mut guard = self.state.write().await;
            guard.slots.insert(slot.to_string(), CredentialRecord::new(token));
            guard.dirty = true;
        }

        self.write_file().await
    }

    async fn clear(&self, slot: &str) -> Result<(), Error> {
        let changed = {
            let mut guard = self.state.write().await;
            let changed = guard.slots.remove(slot).is_some() || guard.dirty;
            guard.dirty |= changed;
            changed
        };

        if changed {
            self.write_file().await?;
        }
        self.discard_backup().await
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write_file().await } else { Ok(()) }
    }
}

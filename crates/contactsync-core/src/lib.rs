// # contactsync-core
//
// Client-side data layer for the ContactSphere contact manager.
//
// ## Architecture Overview
//
// - **ContactApi**: Trait for the backend transport (stateless, credential passed in)
// - **CredentialStore**: Trait for persisting the bearer credential between runs
// - **Session**: Owner of the credential, the current user and the observable state
// - **RemoteClient**: Attaches the credential and tears the session down on rejection
// - **SessionManager**: Bootstrap, login, registration and logout
// - **ContactCollection**: Canonical contact list, mutated only after backend confirmation
// - **ContactClient**: Facade wiring all of the above from a `ClientConfig`
//
// ## Design Principles
//
// 1. **Confirm then mutate**: Local state changes only after the backend agrees
// 2. **Single owner**: Only the session writes the credential
// 3. **Outcomes, not faults**: User-triggered operations report through `Outcome`
// 4. **Library-First**: The CLI is a thin shell over this crate

pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod outcome;
pub mod remote;
pub mod session;
pub mod state;
pub mod traits;
pub mod validation;

// Re-export core types for convenience
pub use client::ContactClient;
pub use collection::ContactCollection;
pub use config::{ClientConfig, CredentialStoreConfig, HttpConfig, DEFAULT_CREDENTIAL_SLOT};
pub use error::{Error, Result};
pub use model::{AuthResponse, Contact, ContactDraft, ContactPatch, LoginRequest, RegisterRequest, User};
pub use outcome::Outcome;
pub use remote::RemoteClient;
pub use session::{Session, SessionManager, SessionState};
pub use state::{FileCredentialStore, MemoryCredentialStore, open_credential_store};
pub use traits::{ContactApi, CredentialRecord, CredentialStore};
pub use validation::{Field, FieldErrors, validate_draft, validate_patch};

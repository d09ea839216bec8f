// # Contact API Trait
//
// Defines the transport interface to the contact backend.
//
// ## Implementations
//
// - HTTP/JSON: `contactsync-http` crate
// - Test doubles: `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use contactsync_core::ContactApi;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* ContactApi implementation */;
//
//     let contacts = api.list_contacts("bearer-token").await?;
//     println!("{} contacts", contacts.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{AuthResponse, Contact, ContactDraft, ContactPatch, LoginRequest, RegisterRequest, User};

/// Trait for contact backend transports
///
/// One method per backend capability. Implementations are stateless: the
/// bearer credential is handed in by the caller on every authenticated
/// call and never cached by the transport.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// ## Allowed
/// - Perform HTTP/HTTPS calls to the configured backend only
/// - Shape requests and parse responses
/// - Map statuses to [`crate::Error`] variants:
///   401 → `Authorization`, other non-2xx → `Remote`, no response → `Transport`
///
/// ## Forbidden
/// - Holding or persisting credentials (owned by `Session`)
/// - Tearing the session down on rejection (owned by `RemoteClient`)
/// - Touching the contact collection (owned by `ContactCollection`)
/// - Retrying (no operation is retried automatically)
#[async_trait]
pub trait ContactApi: Send + Sync {
    /// Create an account (`POST /api/users/register`)
    ///
    /// Does not authenticate.
    async fn register(&self, request: &RegisterRequest) -> Result<(), crate::Error>;

    /// Exchange credentials for a bearer token (`POST /api/users/login`)
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, crate::Error>;

    /// Identity behind `credential` (`GET /api/users/current`)
    async fn current_user(&self, credential: &str) -> Result<User, crate::Error>;

    /// All contacts of the authenticated user (`GET /api/contacts`)
    async fn list_contacts(&self, credential: &str) -> Result<Vec<Contact>, crate::Error>;

    /// One contact (`GET /api/contacts/{id}`)
    async fn get_contact(&self, credential: &str, id: &str) -> Result<Contact, crate::Error>;

    /// Persist a new contact (`POST /api/contacts`)
    ///
    /// # Returns
    ///
    /// The server copy, carrying its authoritative id and timestamps
    async fn create_contact(
        &self,
        credential: &str,
        draft: &ContactDraft,
    ) -> Result<Contact, crate::Error>;

    /// Update fields of a contact (`PUT /api/contacts/{id}`)
    async fn update_contact(
        &self,
        credential: &str,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Contact, crate::Error>;

    /// Delete a contact (`DELETE /api/contacts/{id}`)
    async fn delete_contact(&self, credential: &str, id: &str) -> Result<(), crate::Error>;

    /// Transport name (for logging/debugging)
    fn api_name(&self) -> &'static str;
}

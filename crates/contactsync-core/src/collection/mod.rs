//! Canonical contact collection
//!
//! [`ContactCollection`] owns the in-memory list of the current user's
//! contacts and keeps it consistent with the backend:
//!
//! - Every mutation is confirmed by the backend before the local list
//!   changes. A failed call leaves the list untouched.
//! - Input is validated locally before any network call.
//! - Only complete contacts (non-empty id, name, email and phone) are
//!   ever admitted.
//!
//! ## Ordering
//!
//! `refresh` keeps the backend's order, `create` prepends, `update` and
//! `fetch` replace in place. The lock is never held across a network
//! call, so concurrent mutations of the same id settle in the order their
//! responses arrive.
//!
//! ## Session Changes
//!
//! Each call remembers the session generation it started under. A response
//! that lands after a logout or a new login is dropped instead of applied,
//! and a rejection that ends the session empties the collection.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::model::{Contact, ContactDraft, ContactPatch};
use crate::outcome::Outcome;
use crate::remote::RemoteClient;
use crate::validation::{validate_draft, validate_patch};

const ERROR_TITLE: &str = "Error";
const SESSION_CHANGED: &str = "Your session changed before the request completed.";

/// The client-side source of truth for contacts
#[derive(Debug)]
pub struct ContactCollection {
    remote: RemoteClient,
    contacts: RwLock<Vec<Contact>>,
}

impl ContactCollection {
    /// Create an empty collection
    pub fn new(remote: RemoteClient) -> Self {
        Self {
            remote,
            contacts: RwLock::new(Vec::new()),
        }
    }

    /// Replace the collection with the backend's list
    ///
    /// Returns the number of contacts loaded.
    pub async fn refresh(&self) -> Outcome<usize> {
        let generation = self.generation();
        let fetched = match self.remote.list_contacts().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Failed to fetch contacts: {}", e);
                self.discard_after(&e).await;
                return Outcome::from_error(ERROR_TITLE, &e, "Failed to fetch contacts");
            }
        };

        let total = fetched.len();
        let complete: Vec<Contact> = fetched
            .into_iter()
            .filter(|c| {
                let keep = c.is_complete();
                if !keep {
                    warn!("Dropping incomplete contact from list (id: {:?})", c.id);
                }
                keep
            })
            .collect();

        let count = complete.len();
        if !self.commit(generation, |contacts| *contacts = complete).await {
            return Outcome::failure(ERROR_TITLE, SESSION_CHANGED);
        }
        debug!("Collection refreshed: {} of {} contact(s) admitted", count, total);

        Outcome::success("Contacts Loaded", format!("{} contact(s) loaded.", count)).with_value(count)
    }

    /// Create a contact and prepend the server's copy
    pub async fn create(&self, draft: ContactDraft) -> Outcome<Contact> {
        let draft = draft.trimmed();
        if let Err(errors) = validate_draft(&draft) {
            debug!("Create rejected locally: {}", errors);
            return Outcome::invalid(errors);
        }

        let generation = self.generation();
        let created = match self.remote.create_contact(&draft).await {
            Ok(created) => created,
            Err(e) => {
                warn!("Failed to create contact: {}", e);
                self.discard_after(&e).await;
                return Outcome::from_error(ERROR_TITLE, &e, "Failed to create contact");
            }
        };

        if !created.is_complete() {
            warn!("Backend returned an incomplete contact on create");
            return Outcome::failure(ERROR_TITLE, "Failed to create contact");
        }

        let entry = created.clone();
        if !self.commit(generation, |contacts| contacts.insert(0, entry)).await {
            return Outcome::failure(ERROR_TITLE, SESSION_CHANGED);
        }
        info!("Created contact {}", created.id);

        Outcome::success(
            "Contact Created",
            format!("{} has been added to your contacts.", draft.name),
        )
        .with_value(created)
    }

    /// Apply a partial update to a known contact
    pub async fn update(&self, id: &str, patch: ContactPatch) -> Outcome<Contact> {
        if self.get(id).await.is_none() {
            debug!("Update rejected locally: unknown contact {}", id);
            return Outcome::failure(ERROR_TITLE, "Contact not found");
        }

        let patch = patch.trimmed();
        if let Err(errors) = validate_patch(&patch) {
            debug!("Update rejected locally: {}", errors);
            return Outcome::invalid(errors);
        }

        let generation = self.generation();
        let updated = match self.remote.update_contact(id, &patch).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!("Failed to update contact {}: {}", id, e);
                self.discard_after(&e).await;
                return Outcome::from_error(ERROR_TITLE, &e, "Failed to update contact");
            }
        };

        if !updated.is_complete() {
            warn!("Backend returned an incomplete contact on update of {}", id);
            return Outcome::failure(ERROR_TITLE, "Failed to update contact");
        }

        let entry = updated.clone();
        let mut found = false;
        if !self
            .commit(generation, |contacts| found = replace(contacts, id, entry))
            .await
        {
            return Outcome::failure(ERROR_TITLE, SESSION_CHANGED);
        }
        if !found {
            debug!("Contact {} left the collection before the update landed", id);
        }
        info!("Updated contact {}", id);

        Outcome::success("Contact Updated", "Contact has been successfully updated.").with_value(updated)
    }

    /// Delete a contact once the backend confirms
    pub async fn delete(&self, id: &str) -> Outcome {
        let generation = self.generation();
        if let Err(e) = self.remote.delete_contact(id).await {
            warn!("Failed to delete contact {}: {}", id, e);
            self.discard_after(&e).await;
            return Outcome::from_error(ERROR_TITLE, &e, "Failed to delete contact");
        }

        if !self.commit(generation, |contacts| contacts.retain(|c| c.id != id)).await {
            return Outcome::failure(ERROR_TITLE, SESSION_CHANGED);
        }
        info!("Deleted contact {}", id);

        Outcome::success("Contact Deleted", "Contact has been successfully deleted.")
    }

    /// Load one contact from the backend
    ///
    /// A contact already in the collection is replaced in place with the
    /// server copy; an unknown one is returned but not inserted.
    pub async fn fetch(&self, id: &str) -> Outcome<Contact> {
        let generation = self.generation();
        let contact = match self.remote.get_contact(id).await {
            Ok(contact) => contact,
            Err(e) => {
                warn!("Failed to fetch contact {}: {}", id, e);
                self.discard_after(&e).await;
                return Outcome::from_error(ERROR_TITLE, &e, "Failed to fetch contact");
            }
        };

        if !contact.is_complete() {
            warn!("Backend returned an incomplete contact for {}", id);
            return Outcome::failure(ERROR_TITLE, "Failed to fetch contact");
        }

        let entry = contact.clone();
        if !self
            .commit(generation, |contacts| {
                replace(contacts, id, entry);
            })
            .await
        {
            return Outcome::failure(ERROR_TITLE, SESSION_CHANGED);
        }

        Outcome::success("Contact Loaded", contact.name.clone()).with_value(contact)
    }

    /// Filter the collection without touching the backend
    ///
    /// Name and email match case-insensitively, phone as a plain
    /// substring. The query is trimmed first, so `" jane "` finds the same
    /// contacts as `"jane"` and a blank query returns every contact.
    pub async fn search(&self, query: &str) -> Vec<Contact> {
        let raw = query.trim();
        let contacts = self.contacts.read().await;
        if raw.is_empty() {
            return contacts.clone();
        }

        let needle = raw.to_lowercase();
        contacts
            .iter()
            .filter(|c| c.matches(&needle, raw))
            .cloned()
            .collect()
    }

    /// Snapshot of the collection in display order
    pub async fn contacts(&self) -> Vec<Contact> {
        self.contacts.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Contact> {
        self.contacts.read().await.iter().find(|c| c.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contacts.read().await.is_empty()
    }

    /// Drop every contact (used when the session ends)
    pub async fn reset(&self) {
        self.contacts.write().await.clear();
    }

    fn generation(&self) -> u64 {
        self.remote.session().generation()
    }

    /// Apply `mutate` if the session is still at `generation`
    ///
    /// The check runs under the write lock, so a reset that follows a
    /// session change always lands after any commit that passed it.
    async fn commit(&self, generation: u64, mutate: impl FnOnce(&mut Vec<Contact>)) -> bool {
        let mut contacts = self.contacts.write().await;
        if self.generation() != generation {
            debug!("Dropping response from an ended session (generation {})", generation);
            return false;
        }
        mutate(&mut contacts);
        true
    }

    /// Forget the previous user's contacts once a rejection ended the session
    async fn discard_after(&self, error: &Error) {
        if error.is_authorization() && !self.remote.session().is_authenticated() {
            debug!("Session ended by rejection; clearing contacts");
            self.reset().await;
        }
    }
}

/// Replace the entry with `id` in place; false when it is not present
fn replace(contacts: &mut [Contact], id: &str, contact: Contact) -> bool {
    match contacts.iter_mut().find(|c| c.id == id) {
        Some(slot) => {
            *slot = contact;
            true
        }
        None => false,
    }
}

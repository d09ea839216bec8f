//! Test doubles and common utilities for contract tests
//!
//! `MockContactApi` behaves like a small in-memory backend: it keeps its own
//! contact list, accepts a single credential and can be told to fail any
//! operation. Every call is recorded so tests can assert that local
//! rejections never reach the transport.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Notify;

use contactsync_core::error::{Error, Result};
use contactsync_core::traits::{ContactApi, CredentialRecord, CredentialStore};
use contactsync_core::{
    AuthResponse, Contact, ContactClient, ContactDraft, ContactPatch, LoginRequest, RegisterRequest,
    User,
};

pub const SLOT: &str = "contactsphere_token";
pub const VALID_TOKEN: &str = "valid-token";
pub const PASSWORD: &str = "correct-horse";

/// How a scripted operation should fail
#[derive(Debug, Clone)]
pub enum Failure {
    Remote(u16, String),
    Authorization,
    Transport,
}

impl Failure {
    fn to_error(&self) -> Error {
        match self {
            Failure::Remote(status, message) => Error::remote(*status, message.clone()),
            Failure::Authorization => Error::authorization("401 Unauthorized"),
            Failure::Transport => Error::transport("connection refused"),
        }
    }
}

/// In-memory backend double
pub struct MockContactApi {
    contacts: Mutex<Vec<Contact>>,
    next_id: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    credentials_seen: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    reject_credentials: AtomicBool,
    /// Returned verbatim by the next create, bypassing the in-memory list
    scripted_create: Mutex<Option<Contact>>,
    /// One-shot gates that park the next call of an operation
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    parked: AtomicUsize,
}

impl MockContactApi {
    pub fn new() -> Self {
        Self {
            contacts: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            calls: Mutex::new(Vec::new()),
            credentials_seen: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            reject_credentials: AtomicBool::new(false),
            scripted_create: Mutex::new(None),
            gates: Mutex::new(HashMap::new()),
            parked: AtomicUsize::new(0),
        }
    }

    /// Backend pre-populated with `contacts`
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let api = Self::new();
        api.next_id.store(contacts.len() + 1, Ordering::SeqCst);
        *api.contacts.lock().unwrap() = contacts;
        api
    }

    /// Make `operation` fail until cleared
    pub fn fail(&self, operation: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(operation, failure);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Answer every authenticated call with an authorization rejection
    pub fn reject_credentials(&self, reject: bool) {
        self.reject_credentials.store(reject, Ordering::SeqCst);
    }

    /// Return `contact` from the next create call
    pub fn script_create(&self, contact: Contact) {
        *self.scripted_create.lock().unwrap() = Some(contact);
    }

    /// Replace the backend's copy of a contact without the client knowing
    pub fn put_server_contact(&self, contact: Contact) {
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.iter_mut().find(|c| c.id == contact.id) {
            Some(existing) => *existing = contact,
            None => contacts.push(contact),
        }
    }

    pub fn server_contacts(&self) -> Vec<Contact> {
        self.contacts.lock().unwrap().clone()
    }

    /// Park the next `operation` call until the returned gate is notified
    ///
    /// The credential is checked after release, so rejection settings made
    /// while the call is parked apply to it.
    pub fn hold(&self, operation: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(operation, gate.clone());
        gate
    }

    /// Number of calls that reached a gate
    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self, operation: &'static str) {
        let gate = self.gates.lock().unwrap().remove(operation);
        if let Some(gate) = gate {
            self.parked.fetch_add(1, Ordering::SeqCst);
            gate.notified().await;
        }
    }

    /// Number of calls to `operation`
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|op| **op == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Credentials attached to authenticated calls, in order
    pub fn credentials_seen(&self) -> Vec<String> {
        self.credentials_seen.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(operation);
        match self.failures.lock().unwrap().get(operation) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn authenticate(&self, operation: &'static str, credential: &str) -> Result<()> {
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credential.to_string());
        self.record(operation)?;
        if self.reject_credentials.load(Ordering::SeqCst) || credential != VALID_TOKEN {
            return Err(Error::authorization("401 Unauthorized"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContactApi for MockContactApi {
    async fn register(&self, _request: &RegisterRequest) -> Result<()> {
        self.record("register")
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.record("login")?;
        if request.password != PASSWORD {
            return Err(Error::authorization("401 Unauthorized"));
        }
        Ok(AuthResponse {
            token: VALID_TOKEN.to_string(),
            user: alice_user(),
        })
    }

    async fn current_user(&self, credential: &str) -> Result<User> {
        self.authenticate("current_user", credential)?;
        Ok(alice_user())
    }

    async fn list_contacts(&self, credential: &str) -> Result<Vec<Contact>> {
        self.pass_gate("list_contacts").await;
        self.authenticate("list_contacts", credential)?;
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn get_contact(&self, credential: &str, id: &str) -> Result<Contact> {
        self.authenticate("get_contact", credential)?;
        self.contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::remote(404, "Contact not found"))
    }

    async fn create_contact(&self, credential: &str, draft: &ContactDraft) -> Result<Contact> {
        self.authenticate("create_contact", credential)?;
        if let Some(contact) = self.scripted_create.lock().unwrap().take() {
            return Ok(contact);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let contact = Contact {
            id: id.to_string(),
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            created_at: Some("2025-01-09T12:00:00Z".to_string()),
            updated_at: None,
        };
        self.contacts.lock().unwrap().insert(0, contact.clone());
        Ok(contact)
    }

    async fn update_contact(&self, credential: &str, id: &str, patch: &ContactPatch) -> Result<Contact> {
        self.authenticate("update_contact", credential)?;
        let mut contacts = self.contacts.lock().unwrap();
        let contact = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::remote(404, "Contact not found"))?;

        if let Some(name) = &patch.name {
            contact.name = name.clone();
        }
        if let Some(email) = &patch.email {
            contact.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            contact.phone = phone.clone();
        }
        contact.updated_at = Some("2025-01-10T08:00:00Z".to_string());
        Ok(contact.clone())
    }

    async fn delete_contact(&self, credential: &str, id: &str) -> Result<()> {
        self.pass_gate("delete_contact").await;
        self.authenticate("delete_contact", credential)?;
        let mut contacts = self.contacts.lock().unwrap();
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            return Err(Error::remote(404, "Contact not found"));
        }
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "mock"
    }
}

/// A credential store that counts calls and can refuse writes
#[derive(Clone)]
pub struct MockCredentialStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    save_call_count: Arc<AtomicUsize>,
    clear_call_count: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            save_call_count: Arc::new(AtomicUsize::new(0)),
            clear_call_count: Arc::new(AtomicUsize::new(0)),
            fail_saves: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Store pre-loaded with a token in the default slot
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store
            .slots
            .lock()
            .unwrap()
            .insert(SLOT.to_string(), token.to_string());
        store
    }

    pub fn token(&self) -> Option<String> {
        self.slots.lock().unwrap().get(SLOT).cloned()
    }

    pub fn save_call_count(&self) -> usize {
        self.save_call_count.load(Ordering::SeqCst)
    }

    pub fn clear_call_count(&self) -> usize {
        self.clear_call_count.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().unwrap().get(slot).cloned())
    }

    async fn record(&self, _slot: &str) -> Result<Option<CredentialRecord>> {
        Ok(None)
    }

    async fn save(&self, slot: &str, token: &str) -> Result<()> {
        self.save_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::credential_store("disk full"));
        }
        self.slots
            .lock()
            .unwrap()
            .insert(slot.to_string(), token.to_string());
        Ok(())
    }

    async fn clear(&self, slot: &str) -> Result<()> {
        self.clear_call_count.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().unwrap().remove(slot);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

pub fn alice_user() -> User {
    User {
        id: "1".to_string(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
    }
}

pub fn contact(id: &str, name: &str, email: &str, phone: &str) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        created_at: None,
        updated_at: None,
    }
}

pub fn jane() -> Contact {
    contact("1", "Jane Smith", "jane@x.com", "555-0101")
}

pub fn john() -> Contact {
    contact("2", "John Doe", "john@x.com", "555-0102")
}

/// Client wired to the given doubles
pub fn client_with(api: &Arc<MockContactApi>, store: &MockCredentialStore) -> ContactClient {
    ContactClient::with_store(api.clone(), Box::new(store.clone()), SLOT)
}

/// Client that has bootstrapped, logged in and loaded the backend's contacts
pub async fn logged_in_client(api: &Arc<MockContactApi>, store: &MockCredentialStore) -> ContactClient {
    let client = client_with(api, store);
    client.bootstrap().await;
    let outcome = client.login("alice@example.com", PASSWORD).await;
    assert!(outcome.ok, "login should succeed: {:?}", outcome);
    let refreshed = client.contacts().refresh().await;
    assert!(refreshed.ok, "refresh should succeed: {:?}", refreshed);
    client
}

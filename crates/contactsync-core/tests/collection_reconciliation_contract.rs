//! Contract Test: Confirm-then-Mutate Reconciliation
//!
//! This test verifies that the local collection only changes after the
//! backend confirmed a write, and that it changes exactly as described.
//!
//! Constraints verified:
//! - create prepends the server's copy, length grows by one
//! - failed writes leave the collection untouched
//! - delete removes exactly one entry
//! - update and fetch replace in place, fetch never inserts
//! - search is local and order preserving
//! - drafts and patches are sent trimmed
//! - a response that outlives its session is dropped
//!
//! If this test fails, the client view can drift from the backend.

mod common;

use std::sync::Arc;

use common::*;
use contactsync_core::{Contact, ContactDraft, ContactPatch};
use tokio_test::{assert_err, assert_ok};

fn ids(contacts: &[Contact]) -> Vec<&str> {
    contacts.iter().map(|c| c.id.as_str()).collect()
}

#[tokio::test]
async fn create_prepends_server_contact() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane(), john()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let server_copy = Contact {
        id: "9".to_string(),
        name: "Alice".to_string(),
        email: "a@b.com".to_string(),
        phone: "555-0100".to_string(),
        created_at: Some("T".to_string()),
        updated_at: None,
    };
    api.script_create(server_copy.clone());

    let before = client.contacts().len().await;
    let outcome = client
        .contacts()
        .create(ContactDraft::new("Alice", "a@b.com", "555-0100"))
        .await;

    assert!(outcome.ok);
    assert_eq!(outcome.title, "Contact Created");
    assert_eq!(outcome.message, "Alice has been added to your contacts.");
    assert_eq!(outcome.value.as_ref(), Some(&server_copy));

    let contacts = client.contacts().contacts().await;
    assert_eq!(contacts.len(), before + 1);
    assert_eq!(contacts[0], server_copy);
    assert_eq!(ids(&contacts), vec!["9", "1", "2"]);
}

#[tokio::test]
async fn failed_create_leaves_collection_unchanged() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    api.fail("create_contact", Failure::Remote(409, "Contact already exists".to_string()));
    let outcome = client
        .contacts()
        .create(ContactDraft::new("Alice", "a@b.com", "555-0100"))
        .await;

    assert!(!outcome.ok);
    assert_eq!(outcome.title, "Error");
    assert_eq!(outcome.message, "Contact already exists");

    let contacts = client.contacts().contacts().await;
    assert_eq!(contacts.len(), 1);
    assert!(contacts.iter().all(|c| c.name != "Alice"));

    api.fail("create_contact", Failure::Transport);
    let outcome = client
        .contacts()
        .create(ContactDraft::new("Alice", "a@b.com", "555-0100"))
        .await;
    assert_eq!(outcome.message, "Failed to create contact");
    assert_eq!(client.contacts().len().await, 1);
}

#[tokio::test]
async fn incomplete_server_contact_is_not_admitted() {
    let api = Arc::new(MockContactApi::new());
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    api.script_create(contact("", "Alice", "a@b.com", "555-0100"));
    let outcome = client
        .contacts()
        .create(ContactDraft::new("Alice", "a@b.com", "555-0100"))
        .await;

    assert!(!outcome.ok);
    assert!(client.contacts().is_empty().await);
}

#[tokio::test]
async fn refresh_replaces_wholesale_and_drops_incomplete() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;
    assert_eq!(client.contacts().len().await, 1);

    api.put_server_contact(john());
    api.put_server_contact(contact("3", "No Phone", "np@x.com", ""));

    let outcome = client.contacts().refresh().await;
    assert!(outcome.ok);
    assert_eq!(outcome.value, Some(2));
    assert_eq!(ids(&client.contacts().contacts().await), vec!["1", "2"]);

    api.fail("list_contacts", Failure::Remote(500, String::new()));
    let outcome = client.contacts().refresh().await;
    assert!(!outcome.ok);
    assert_eq!(outcome.message, "Failed to fetch contacts");
    assert_eq!(client.contacts().len().await, 2, "failed refresh keeps the old list");
}

#[tokio::test]
async fn delete_removes_exactly_one_entry() {
    let api = Arc::new(MockContactApi::with_contacts(vec![
        jane(),
        john(),
        contact("3", "Ann Lee", "ann@x.com", "555-0103"),
    ]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let outcome = client.contacts().delete("2").await;
    assert!(outcome.ok);
    assert_eq!(outcome.title, "Contact Deleted");
    assert_eq!(ids(&client.contacts().contacts().await), vec!["1", "3"]);
}

#[tokio::test]
async fn failed_delete_keeps_entry() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane(), john()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    api.fail("delete_contact", Failure::Transport);
    let outcome = client.contacts().delete("1").await;

    assert!(!outcome.ok);
    assert_eq!(outcome.message, "Failed to delete contact");
    assert_eq!(client.contacts().get("1").await, Some(jane()));
    assert_eq!(client.contacts().len().await, 2);
}

#[tokio::test]
async fn update_replaces_in_place() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane(), john()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let outcome = client
        .contacts()
        .update("1", ContactPatch::new().with_phone("555-0199"))
        .await;

    assert!(outcome.ok);
    assert_eq!(outcome.title, "Contact Updated");
    let contacts = client.contacts().contacts().await;
    assert_eq!(ids(&contacts), vec!["1", "2"]);
    assert_eq!(contacts[0].phone, "555-0199");
    assert_eq!(contacts[0].name, "Jane Smith");
    assert!(contacts[0].updated_at.is_some());
}

#[tokio::test]
async fn update_of_unknown_id_fails_locally() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let outcome = client
        .contacts()
        .update("42", ContactPatch::new().with_name("Ghost"))
        .await;

    assert!(!outcome.ok);
    assert_eq!(api.call_count("update_contact"), 0);
    assert_eq!(client.contacts().contacts().await, vec![jane()]);
}

#[tokio::test]
async fn failed_update_leaves_entry_unchanged() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    api.fail("update_contact", Failure::Remote(422, "Email already used".to_string()));
    let outcome = client
        .contacts()
        .update("1", ContactPatch::new().with_email("taken@x.com"))
        .await;

    assert_eq!(outcome.message, "Email already used");
    assert_eq!(client.contacts().get("1").await, Some(jane()));
}

#[tokio::test]
async fn fetch_replaces_known_and_never_inserts() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let renamed = contact("1", "Jane Carter", "jane@x.com", "555-0101");
    api.put_server_contact(renamed.clone());
    api.put_server_contact(john());

    let outcome = client.contacts().fetch("1").await;
    assert!(outcome.ok);
    assert_eq!(outcome.value.as_ref(), Some(&renamed));
    assert_eq!(client.contacts().contacts().await, vec![renamed]);

    let outcome = client.contacts().fetch("2").await;
    assert_eq!(outcome.value, Some(john()));
    assert_eq!(client.contacts().len().await, 1, "fetch must not insert");

    let outcome = client.contacts().fetch("404").await;
    assert!(!outcome.ok);
    assert_eq!(outcome.message, "Contact not found");
}

#[tokio::test]
async fn search_matches_name_email_and_phone() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane(), john()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;
    let calls_before = api.total_calls();

    let found = client.contacts().search("jane").await;
    assert_eq!(found, vec![jane()]);

    assert_eq!(client.contacts().search("JOHN@X").await, vec![john()]);
    assert_eq!(client.contacts().search("0102").await, vec![john()]);
    assert_eq!(ids(&client.contacts().search("x.com").await), vec!["1", "2"]);
    assert_eq!(client.contacts().search("   ").await.len(), 2);
    assert_eq!(client.contacts().search("  jane ").await, vec![jane()]);
    assert!(client.contacts().search("zed").await.is_empty());

    assert_eq!(api.total_calls(), calls_before, "search never calls the backend");
}

#[tokio::test]
async fn remote_errors_surface_through_remote_client() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let remote = contactsync_core::RemoteClient::new(api.clone(), client.session().clone());
    assert_ok!(remote.get_contact("1").await);
    assert_err!(remote.get_contact("nope").await);
}

#[tokio::test]
async fn padded_input_is_sent_trimmed() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane()]));
    let store = MockCredentialStore::new();
    let client = logged_in_client(&api, &store).await;

    let outcome = client
        .contacts()
        .create(ContactDraft::new(" Alice ", " a@b.com ", " 555-0100\t"))
        .await;
    let created = assert_ok!(outcome.value.ok_or("create should succeed"));
    assert_eq!(created.name, "Alice");
    assert_eq!(created.email, "a@b.com");
    assert_eq!(created.phone, "555-0100");
    assert_eq!(outcome.message, "Alice has been added to your contacts.");

    let outcome = client
        .contacts()
        .update("1", ContactPatch::new().with_email("  janet@x.com "))
        .await;
    assert!(outcome.ok);
    let server = api.server_contacts();
    let jane_on_server = server.iter().find(|c| c.id == "1").unwrap();
    assert_eq!(jane_on_server.email, "janet@x.com");
}

#[tokio::test]
async fn late_response_from_ended_session_is_dropped() {
    let api = Arc::new(MockContactApi::with_contacts(vec![jane(), john()]));
    let store = MockCredentialStore::new();
    let client = Arc::new(logged_in_client(&api, &store).await);

    let gate = api.hold("list_contacts");
    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.contacts().refresh().await }
    });
    while api.parked() == 0 {
        tokio::task::yield_now().await;
    }

    client.logout().await;
    assert!(client.login("alice@example.com", PASSWORD).await.ok);
    assert!(client.contacts().is_empty().await);

    gate.notify_one();
    let outcome = pending.await.unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.message, "Your session changed before the request completed.");
    assert!(client.contacts().is_empty().await);
    assert!(client.sessions().is_authenticated());
}

//! Core traits for the contact client
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ContactApi`]: Talk to the contact backend
//! - [`CredentialStore`]: Persist the bearer credential

pub mod contact_api;
pub mod credential_store;

pub use contact_api::ContactApi;
pub use credential_store::{CredentialRecord, CredentialStore};

//! Local validation of contact drafts and patches
//!
//! Runs before any create/update network call. Failures are collected per
//! field so the presentation layer can highlight each input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ContactDraft, ContactPatch};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("phone pattern compiles"));

/// A validated contact field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
}

impl Field {
    /// Field name as used in forms and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation messages keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Look up by field name (`"name"`, `"email"`, `"phone"`)
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, message)| message.as_str())
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Validate a full draft: all three fields are required
pub fn validate_draft(draft: &ContactDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_name(&draft.name, &mut errors);
    check_email(&draft.email, &mut errors);
    check_phone(&draft.phone, &mut errors);
    errors.into_result()
}

/// Validate a patch: only the fields present are checked
pub fn validate_patch(patch: &ContactPatch) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if let Some(name) = &patch.name {
        check_name(name, &mut errors);
    }
    if let Some(email) = &patch.email {
        check_email(email, &mut errors);
    }
    if let Some(phone) = &patch.phone {
        check_phone(phone, &mut errors);
    }
    errors.into_result()
}

/// Whether `email` has a basic `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Whether `phone` only uses digits, spaces, `-`, parentheses and a leading `+`
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone.trim())
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    if name.trim().is_empty() {
        errors.insert(Field::Name, "Name is required");
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !is_valid_email(email) {
        errors.insert(Field::Email, "Please enter a valid email");
    }
}

fn check_phone(phone: &str, errors: &mut FieldErrors) {
    if phone.trim().is_empty() {
        errors.insert(Field::Phone, "Phone number is required");
    } else if !is_valid_phone(phone) {
        errors.insert(Field::Phone, "Please enter a valid phone number");
    }
}

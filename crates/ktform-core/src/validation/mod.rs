//! Form data collector
//!
//! Turns raw [`FormState`] plus the accumulated attachments into a validated
//! [`SubmissionRecord`], or a list of field-level errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use validator::{Validate, ValidateEmail};

use crate::models::{AccessEntry, Attachment, Contact, FormState, SubmissionRecord};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const MISSING_SIGNATURE_MESSAGE: &str = "Please provide your signature";
pub const MISSING_CONTACT_MESSAGE: &str = "At least one contact with a name and email is required";
pub const MISSING_ACCESS_MESSAGE: &str = "At least one access entry is required";
pub const MISSING_ACTION_MESSAGE: &str = "Please select an action";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// camelCase field name, with `[index]` for row fields
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All validation failures of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Build a [`SubmissionRecord`] from the current form state.
///
/// Every value is trimmed. Contact and access rows are walked in order and contribute
/// an entry only when at least one of their sub-fields is non-empty. `now` becomes the
/// record's submission date.
pub fn collect(
    state: &FormState,
    attachments: &[Attachment],
    now: DateTime<Utc>,
) -> Result<SubmissionRecord, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let fields = state.fields.trimmed();
    if let Err(field_errors) = fields.validate() {
        let mut scalar: Vec<FieldError> = field_errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = if errs.iter().any(|e| e.code == "length") {
                    REQUIRED_MESSAGE.to_string()
                } else {
                    errs.first()
                        .and_then(|e| e.message.as_ref())
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| INVALID_EMAIL_MESSAGE.to_string())
                };
                FieldError::new(to_camel_case(&field), message)
            })
            .collect();
        // HashMap order is unstable
        scalar.sort_by(|a, b| a.field.cmp(&b.field));
        errors.0.extend(scalar);
    }

    let mut contacts = Vec::new();
    for (index, row) in state.contacts.iter().enumerate() {
        let name = row.name.trim();
        let email = row.email.trim();
        if name.is_empty() && email.is_empty() {
            continue;
        }
        if !email.is_empty() && !email.validate_email() {
            errors.push(format!("contacts[{}].email", index), INVALID_EMAIL_MESSAGE);
        }
        contacts.push(Contact {
            name: name.to_string(),
            email: email.to_string(),
        });
    }
    if !contacts
        .iter()
        .any(|c| !c.name.is_empty() && !c.email.is_empty())
    {
        errors.push("contacts", MISSING_CONTACT_MESSAGE);
    }

    let mut access_entries = Vec::new();
    let mut contributing_rows = 0usize;
    for (index, row) in state.access_entries.iter().enumerate() {
        let credentials = row.credentials.trim();
        if credentials.is_empty() && row.action.is_none() {
            continue;
        }
        contributing_rows += 1;
        if credentials.is_empty() {
            errors.push(format!("accessEntries[{}].credentials", index), REQUIRED_MESSAGE);
        }
        match row.action {
            Some(action) => access_entries.push(AccessEntry {
                credentials: credentials.to_string(),
                action,
            }),
            None => errors.push(
                format!("accessEntries[{}].action", index),
                MISSING_ACTION_MESSAGE,
            ),
        }
    }
    if contributing_rows == 0 {
        errors.push("accessEntries", MISSING_ACCESS_MESSAGE);
    }

    let signature = state
        .signature
        .as_deref()
        .map(str::trim)
        .filter(|s| signature_has_content(s))
        .map(str::to_string);
    if signature.is_none() {
        errors.push("signature", MISSING_SIGNATURE_MESSAGE);
    }

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "Form validation failed");
        return Err(errors);
    }

    Ok(SubmissionRecord::new(
        fields,
        contacts,
        access_entries,
        attachments.to_vec(),
        signature,
        now,
    ))
}

/// A data URL with an empty body is what a cleared drawing surface produces.
fn signature_has_content(value: &str) -> bool {
    match value.split_once(',') {
        Some((_, body)) => !body.trim().is_empty(),
        None => !value.is_empty(),
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

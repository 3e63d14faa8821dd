use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::FormFields;
use crate::constants::FORM_VERSION;

/// What should happen to an account or credential after the employee leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessAction {
    Transfer,
    Deactivate,
    TransferAndDeactivate,
}

impl Display for AccessAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AccessAction::Transfer => write!(f, "Transfer"),
            AccessAction::Deactivate => write!(f, "Deactivate"),
            AccessAction::TransferAndDeactivate => write!(f, "Transfer and Deactivate"),
        }
    }
}

impl FromStr for AccessAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "Transfer-and-Deactivate", "transfer and  deactivate" and friends all collapse
        let normalized = s
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        match normalized.as_str() {
            "transfer" => Ok(AccessAction::Transfer),
            "deactivate" => Ok(AccessAction::Deactivate),
            "transfer and deactivate" | "transfer & deactivate" => {
                Ok(AccessAction::TransferAndDeactivate)
            }
            _ => Err(anyhow::anyhow!("Invalid access action: {}", s)),
        }
    }
}

impl Serialize for AccessAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccessAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A key contact that will be handed the employee's responsibilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

/// An account/credential with its resolved handover action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub credentials: String,
    pub action: AccessAction,
}

/// A user-selected file held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content: Bytes,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Identity used for de-duplication.
    pub fn identity(&self) -> (&str, u64) {
        (&self.file_name, self.size_bytes)
    }
}

/// Validated, trimmed snapshot of one submission attempt.
///
/// Produced only by the collector; downstream stages receive it by shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub fields: FormFields,
    pub contacts: Vec<Contact>,
    pub access_entries: Vec<AccessEntry>,
    pub attachments: Vec<Attachment>,
    /// `data:image/png;base64,...`
    pub signature: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub form_version: String,
}

impl SubmissionRecord {
    pub fn new(
        fields: FormFields,
        contacts: Vec<Contact>,
        access_entries: Vec<AccessEntry>,
        attachments: Vec<Attachment>,
        signature: Option<String>,
        submission_date: DateTime<Utc>,
    ) -> Self {
        Self {
            fields,
            contacts,
            access_entries,
            attachments,
            signature,
            submission_date,
            form_version: FORM_VERSION.to_string(),
        }
    }

    pub fn employee_name(&self) -> &str {
        &self.fields.employee_name
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::AccessAction;

/// Scalar form fields, as entered.
///
/// The same struct doubles as the trimmed, validated field set carried by a
/// [`SubmissionRecord`](super::SubmissionRecord), so the wire names stay in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FormFields {
    #[validate(length(min = 1, message = "This field is required"))]
    pub employee_name: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub designation: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub department: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub reporting_manager_name: String,
    #[validate(
        length(min = 1, message = "This field is required"),
        email(message = "Please enter a valid email address")
    )]
    pub reporting_manager_email: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub employee_id: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub date_of_joining: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub last_working_day: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub current_responsibilities: String,
    pub ongoing_projects: String,
    pub tools_systems: String,
    pub key_documents: String,
    pub sops: String,
    pub successor: String,
    pub areas_handed_over: String,
    pub areas_pending: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub employee_signature_date: String,
}

impl FormFields {
    /// Copy with every value trimmed.
    pub fn trimmed(&self) -> Self {
        let t = |s: &String| s.trim().to_string();
        FormFields {
            employee_name: t(&self.employee_name),
            designation: t(&self.designation),
            department: t(&self.department),
            reporting_manager_name: t(&self.reporting_manager_name),
            reporting_manager_email: t(&self.reporting_manager_email),
            employee_id: t(&self.employee_id),
            date_of_joining: t(&self.date_of_joining),
            last_working_day: t(&self.last_working_day),
            current_responsibilities: t(&self.current_responsibilities),
            ongoing_projects: t(&self.ongoing_projects),
            tools_systems: t(&self.tools_systems),
            key_documents: t(&self.key_documents),
            sops: t(&self.sops),
            successor: t(&self.successor),
            areas_handed_over: t(&self.areas_handed_over),
            areas_pending: t(&self.areas_pending),
            employee_signature_date: t(&self.employee_signature_date),
        }
    }
}

/// One "key contact" row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactRow {
    pub name: String,
    pub email: String,
}

impl ContactRow {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One "access & credentials" row with its explicitly selected action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRow {
    pub credentials: String,
    #[serde(deserialize_with = "deserialize_optional_action")]
    pub action: Option<AccessAction>,
}

impl AccessRow {
    pub fn new(credentials: impl Into<String>, action: Option<AccessAction>) -> Self {
        Self {
            credentials: credentials.into(),
            action,
        }
    }
}

/// Everything the user has entered, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    #[serde(flatten)]
    pub fields: FormFields,
    pub contacts: Vec<ContactRow>,
    pub access_entries: Vec<AccessRow>,
    /// Signature bitmap as a `data:image/png;base64,...` URL
    pub signature: Option<String>,
}

/// Blank or missing actions mean "nothing selected".
fn deserialize_optional_action<'de, D>(deserializer: D) -> Result<Option<AccessAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

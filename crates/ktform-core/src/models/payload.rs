//! Outbound webhook payload.
//!
//! Field names match what existing automation scenarios already consume, so every
//! struct serializes in camelCase and optional fields are omitted rather than null.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccessEntry, Contact, FormFields, PerformanceMetrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub form_data: FormDataPayload,
    pub contacts: Vec<Contact>,
    pub access_credentials: Vec<AccessEntry>,
    pub attachments: Vec<AttachmentPayload>,
    pub pdf: Option<DocumentPayload>,
    pub employee_signature: Option<SignaturePayload>,
    pub analytics: AnalyticsPayload,
}

impl WebhookPayload {
    /// Replace every binary field with its metadata-only stand-in.
    pub fn strip_binary_content(&mut self) {
        for attachment in &mut self.attachments {
            attachment.mime_type = None;
            attachment.base64_content = None;
        }
        if let Some(pdf) = self.pdf.as_mut() {
            pdf.mime_type = None;
            pdf.base64_content = None;
        }
        if let Some(signature) = self.employee_signature.as_mut() {
            signature.base64_content = None;
        }
    }

    pub fn has_binary_content(&self) -> bool {
        self.attachments.iter().any(|a| a.base64_content.is_some())
            || self
                .pdf
                .as_ref()
                .is_some_and(|p| p.base64_content.is_some())
            || self
                .employee_signature
                .as_ref()
                .is_some_and(|s| s.base64_content.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDataPayload {
    #[serde(flatten)]
    pub fields: FormFields,
    pub submission_date: DateTime<Utc>,
    pub form_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// Data-URL header, e.g. `data:application/pdf;base64`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
    /// Full data URL when inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    pub session_id: String,
    pub submission_time: DateTime<Utc>,
    pub performance_metrics: PerformanceMetrics,
    pub request_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stand_ins_keep_metadata_and_references() {
        let mut payload = WebhookPayload {
            form_data: FormDataPayload {
                fields: FormFields::default(),
                submission_date: Utc::now(),
                form_version: "1.0".to_string(),
            },
            contacts: vec![],
            access_credentials: vec![],
            attachments: vec![AttachmentPayload {
                file_name: "plan.pdf".to_string(),
                file_size: 42,
                file_type: "application/pdf".to_string(),
                mime_type: Some("data:application/pdf;base64".to_string()),
                base64_content: Some("JVBERi0=".to_string()),
                s3_url: None,
                s3_key: None,
            }],
            pdf: Some(DocumentPayload {
                file_name: "KT_Form_Jane_2024-01-01.pdf".to_string(),
                mime_type: None,
                base64_content: None,
                s3_url: Some("https://b.s3.eu-west-1.amazonaws.com/kt-forms/1-KT.pdf".to_string()),
                s3_key: Some("kt-forms/1-KT.pdf".to_string()),
            }),
            employee_signature: Some(SignaturePayload {
                base64_content: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
                s3_url: None,
                s3_key: None,
            }),
            analytics: AnalyticsPayload {
                session_id: "kt_1_abc".to_string(),
                submission_time: Utc::now(),
                performance_metrics: PerformanceMetrics::default(),
                request_id: "req_1_abcde".to_string(),
            },
        };
        assert!(payload.has_binary_content());

        payload.strip_binary_content();
        assert!(!payload.has_binary_content());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["attachments"][0]["fileName"], "plan.pdf");
        assert_eq!(json["attachments"][0]["fileSize"], 42);
        assert!(json["attachments"][0].get("base64Content").is_none());
        assert_eq!(json["pdf"]["s3Key"], "kt-forms/1-KT.pdf");
        assert_eq!(json["employeeSignature"], serde_json::json!({}));
        assert_eq!(json["formData"]["formVersion"], "1.0");
        assert!(json["formData"].get("employeeName").is_some());
    }
}

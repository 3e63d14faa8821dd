//! Delivery stage
//!
//! Builds the webhook payload in one transport mode, enforces the payload size
//! ceiling and POSTs it to the resolved target.

use chrono::Utc;
use ktform_core::constants::PDF_CONTENT_TYPE;
use ktform_core::models::{
    AnalyticsPayload, AttachmentPayload, DeliveryOutcome, DocumentPayload, FormDataPayload,
    GeneratedDocument, OutcomeStatus, PersistedArtifacts, SignaturePayload, SubmissionRecord,
    TransportMode, UploadResult, WebhookPayload,
};
use ktform_core::{AppError, Config};
use ktform_processing::encode_base64;
use std::sync::Arc;
use std::time::Instant;

use crate::http::{HttpClient, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to serialize webhook payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        AppError::Delivery(err.to_string())
    }
}

/// Where the payload goes and how much of the response is observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// Same-origin relay: the status is visible and non-2xx is a failure.
    Relay(String),
    /// Webhook called directly: the response is opaque, dispatch counts as success.
    Direct(String),
}

impl DeliveryTarget {
    /// A configured relay wins over the direct webhook URL.
    pub fn resolve(relay_url: Option<&str>, webhook_url: Option<&str>) -> Option<Self> {
        relay_url
            .map(|url| DeliveryTarget::Relay(url.to_string()))
            .or_else(|| webhook_url.map(|url| DeliveryTarget::Direct(url.to_string())))
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::resolve(config.relay_url(), config.webhook_url()).ok_or_else(|| {
            AppError::Config("either RELAY_URL or WEBHOOK_URL must be set".to_string())
        })
    }

    pub fn url(&self) -> &str {
        match self {
            DeliveryTarget::Relay(url) | DeliveryTarget::Direct(url) => url,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, DeliveryTarget::Relay(_))
    }
}

impl std::fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryTarget::Relay(url) => write!(f, "relay {}", url),
            DeliveryTarget::Direct(url) => write!(f, "direct webhook {}", url),
        }
    }
}

/// Assemble the payload with every artifact in `mode`.
///
/// `Remote` carries URL and key only, `Inline` carries encoded content only; an
/// artifact is never split across both.
pub fn build_payload(
    record: &SubmissionRecord,
    document: &GeneratedDocument,
    artifacts: &PersistedArtifacts,
    mode: TransportMode,
    analytics: AnalyticsPayload,
) -> WebhookPayload {
    let attachments = record
        .attachments
        .iter()
        .enumerate()
        .map(|(index, attachment)| {
            let mut payload = AttachmentPayload {
                file_name: attachment.file_name.clone(),
                file_size: attachment.size_bytes,
                file_type: attachment.mime_type.clone(),
                mime_type: None,
                base64_content: None,
                s3_url: None,
                s3_key: None,
            };
            // An attachment without a stored copy still has to reach the webhook.
            let stored = artifacts
                .attachments
                .get(index)
                .filter(|result| result.is_persisted());
            match (mode, stored) {
                (TransportMode::Remote, Some(result)) => {
                    (payload.s3_url, payload.s3_key) = remote_fields(result);
                }
                (TransportMode::Remote, None) => {
                    tracing::warn!(
                        attachment = %attachment.file_name,
                        "No upload result for attachment, sending it inline"
                    );
                    payload.mime_type = Some(data_url_header(&attachment.mime_type));
                    payload.base64_content = Some(encode_base64(&attachment.content));
                }
                (TransportMode::Inline, _) => {
                    payload.mime_type = Some(data_url_header(&attachment.mime_type));
                    payload.base64_content = Some(encode_base64(&attachment.content));
                }
            }
            payload
        })
        .collect();

    let mut pdf = DocumentPayload {
        file_name: document.file_name.clone(),
        mime_type: None,
        base64_content: None,
        s3_url: None,
        s3_key: None,
    };
    match mode {
        TransportMode::Remote => {
            (pdf.s3_url, pdf.s3_key) = remote_fields(&artifacts.document);
        }
        TransportMode::Inline => {
            pdf.mime_type = Some(data_url_header(PDF_CONTENT_TYPE));
            pdf.base64_content = Some(encode_base64(&document.content));
        }
    }

    let employee_signature = record.signature.as_ref().map(|data_url| match mode {
        TransportMode::Remote => {
            let (s3_url, s3_key) = artifacts
                .signature
                .as_ref()
                .map(remote_fields)
                .unwrap_or((None, None));
            SignaturePayload {
                base64_content: None,
                s3_url,
                s3_key,
            }
        }
        TransportMode::Inline => SignaturePayload {
            base64_content: Some(data_url.clone()),
            s3_url: None,
            s3_key: None,
        },
    });

    WebhookPayload {
        form_data: FormDataPayload {
            fields: record.fields.clone(),
            submission_date: record.submission_date,
            form_version: record.form_version.clone(),
        },
        contacts: record.contacts.clone(),
        access_credentials: record.access_entries.clone(),
        attachments,
        pdf: Some(pdf),
        employee_signature,
        analytics,
    }
}

fn remote_fields(result: &UploadResult) -> (Option<String>, Option<String>) {
    match &result.reference {
        Some(reference) => (Some(reference.url.clone()), Some(reference.key.clone())),
        None => (None, None),
    }
}

/// Header half of a data URL, as a browser `FileReader` would produce it.
fn data_url_header(mime_type: &str) -> String {
    format!("data:{};base64", mime_type)
}

/// Serialized body ready to send, with its size in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBody {
    pub body: String,
    pub payload_chars: usize,
    /// Binary fields were replaced by metadata-only stand-ins.
    pub stripped: bool,
}

/// Serialize `payload`, falling back to stand-ins when it exceeds `max_chars`.
pub fn prepare_body(
    payload: &mut WebhookPayload,
    max_chars: usize,
) -> Result<PreparedBody, serde_json::Error> {
    let body = serde_json::to_string(payload)?;
    let payload_chars = body.chars().count();
    if payload_chars <= max_chars || !payload.has_binary_content() {
        return Ok(PreparedBody {
            body,
            payload_chars,
            stripped: false,
        });
    }

    tracing::warn!(
        payload_chars,
        max_chars,
        "Payload too large, replacing binary content with metadata"
    );
    payload.strip_binary_content();
    let body = serde_json::to_string(payload)?;
    let stripped_chars = body.chars().count();
    tracing::info!(
        original_chars = payload_chars,
        payload_chars = stripped_chars,
        "Optimized payload prepared"
    );

    Ok(PreparedBody {
        body,
        payload_chars: stripped_chars,
        stripped: true,
    })
}

/// Sends one payload per call and reports the outcome; it never retries.
#[derive(Clone)]
pub struct DeliveryStage {
    http: Arc<dyn HttpClient>,
    target: DeliveryTarget,
    max_payload_chars: usize,
}

impl std::fmt::Debug for DeliveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryStage")
            .field("target", &self.target)
            .field("max_payload_chars", &self.max_payload_chars)
            .finish()
    }
}

impl DeliveryStage {
    pub fn new(http: Arc<dyn HttpClient>, target: DeliveryTarget, max_payload_chars: usize) -> Self {
        Self {
            http,
            target,
            max_payload_chars,
        }
    }

    pub fn target(&self) -> &DeliveryTarget {
        &self.target
    }

    #[tracing::instrument(
        skip(self, payload),
        fields(request_id = %payload.analytics.request_id, target = %self.target)
    )]
    pub async fn deliver(&self, mut payload: WebhookPayload) -> DeliveryOutcome {
        let request_id = payload.analytics.request_id.clone();
        let start = Instant::now();

        let (payload_chars, result) = match prepare_body(&mut payload, self.max_payload_chars) {
            Ok(prepared) => {
                let chars = prepared.payload_chars;
                (chars, self.send(prepared.body).await)
            }
            Err(e) => (0, Err(DeliveryError::from(e))),
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(status) => {
                tracing::info!(
                    status,
                    latency_ms,
                    payload_chars,
                    visible = self.target.is_visible(),
                    "Webhook request sent"
                );
                DeliveryOutcome {
                    request_id,
                    status: OutcomeStatus::Sent,
                    timestamp: Utc::now(),
                    latency_ms,
                    payload_chars,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    latency_ms,
                    payload_chars,
                    "Webhook delivery failed"
                );
                DeliveryOutcome {
                    request_id,
                    status: OutcomeStatus::Error,
                    timestamp: Utc::now(),
                    latency_ms,
                    payload_chars,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn send(&self, body: String) -> Result<u16, DeliveryError> {
        let response = self.http.post(self.target.url(), body).await?;
        if self.target.is_visible() && !response.is_success() {
            return Err(DeliveryError::Rejected {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        analytics_payload, persisted, sample_document, sample_record, unpersisted, MockHttpClient,
    };
    use crate::http::HttpResponse;
    use bytes::Bytes;
    use ktform_core::models::{ArtifactKind, Attachment};

    fn record_with_attachment(size: usize) -> SubmissionRecord {
        let mut record = sample_record();
        record.attachments = vec![Attachment::new(
            "handover.zip",
            "application/zip",
            Bytes::from(vec![7u8; size]),
        )];
        record
    }

    fn all_persisted(record: &SubmissionRecord) -> PersistedArtifacts {
        PersistedArtifacts {
            attachments: record
                .attachments
                .iter()
                .map(|a| persisted(ArtifactKind::Attachment, &a.file_name))
                .collect(),
            document: persisted(ArtifactKind::Document, "KT_Form_Jane_Doe_2024-06-28.pdf"),
            signature: Some(persisted(ArtifactKind::Signature, "signature-1.png")),
        }
    }

    #[test]
    fn remote_payload_carries_references_only() {
        let record = record_with_attachment(16);
        let artifacts = all_persisted(&record);
        let payload = build_payload(
            &record,
            &sample_document(),
            &artifacts,
            TransportMode::Remote,
            analytics_payload(),
        );

        assert!(!payload.has_binary_content());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["attachments"][0]["fileName"], "handover.zip");
        assert_eq!(json["attachments"][0]["fileSize"], 16);
        assert_eq!(json["attachments"][0]["fileType"], "application/zip");
        assert!(json["attachments"][0]["s3Key"]
            .as_str()
            .unwrap()
            .starts_with("kt-forms/"));
        assert!(json["pdf"]["s3Url"].is_string());
        assert!(json["employeeSignature"]["s3Key"].is_string());
        assert!(json["employeeSignature"].get("base64Content").is_none());
        assert_eq!(json["accessCredentials"][0]["action"], "Transfer and Deactivate");
        assert_eq!(json["analytics"]["requestId"], "req_1719567000000_abcde");
    }

    #[test]
    fn inline_payload_carries_content_only() {
        let record = record_with_attachment(3);
        let artifacts = all_persisted(&record);
        let payload = build_payload(
            &record,
            &sample_document(),
            &artifacts,
            TransportMode::Inline,
            analytics_payload(),
        );

        let json = serde_json::to_value(&payload).unwrap();
        let attachment = &json["attachments"][0];
        assert_eq!(attachment["mimeType"], "data:application/zip;base64");
        assert_eq!(attachment["base64Content"], "BwcH");
        assert!(attachment.get("s3Url").is_none());
        assert_eq!(json["pdf"]["mimeType"], "data:application/pdf;base64");
        assert!(json["pdf"].get("s3Key").is_none());
        assert_eq!(
            json["employeeSignature"]["base64Content"],
            record.signature.clone().unwrap()
        );
    }

    #[test]
    fn attachment_without_upload_result_is_sent_inline() {
        let mut record = record_with_attachment(3);
        record.attachments.push(Attachment::new(
            "extra.txt",
            "text/plain",
            Bytes::from_static(b"hi"),
        ));
        // Only the first attachment has a result.
        let artifacts = all_persisted(&record_with_attachment(3));

        let payload = build_payload(
            &record,
            &sample_document(),
            &artifacts,
            TransportMode::Remote,
            analytics_payload(),
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["attachments"].as_array().unwrap().len(), 2);
        assert!(json["attachments"][0]["s3Key"].is_string());
        assert!(json["attachments"][0].get("base64Content").is_none());
        assert_eq!(json["attachments"][1]["fileName"], "extra.txt");
        assert_eq!(json["attachments"][1]["base64Content"], "aGk=");
        assert!(json["attachments"][1].get("s3Key").is_none());
    }

    #[test]
    fn oversized_payload_falls_below_the_ceiling() {
        let record = record_with_attachment(64 * 1024);
        let artifacts = PersistedArtifacts {
            attachments: vec![unpersisted(ArtifactKind::Attachment, "handover.zip")],
            document: unpersisted(ArtifactKind::Document, "KT.pdf"),
            signature: None,
        };
        let mut payload = build_payload(
            &record,
            &sample_document(),
            &artifacts,
            TransportMode::Inline,
            analytics_payload(),
        );

        let ceiling = 20_000;
        let prepared = prepare_body(&mut payload, ceiling).unwrap();

        assert!(prepared.stripped);
        assert!(prepared.payload_chars <= ceiling);
        assert!(!prepared.body.contains("base64Content"));
        let json: serde_json::Value = serde_json::from_str(&prepared.body).unwrap();
        assert_eq!(json["attachments"][0]["fileSize"], 64 * 1024);
        assert_eq!(json["pdf"]["fileName"], "KT_Form_Jane_Doe_2024-06-28.pdf");
    }

    #[test]
    fn small_payload_is_sent_as_built() {
        let record = record_with_attachment(8);
        let artifacts = all_persisted(&record);
        let mut payload = build_payload(
            &record,
            &sample_document(),
            &artifacts,
            TransportMode::Inline,
            analytics_payload(),
        );
        let prepared = prepare_body(&mut payload, 10_000_000).unwrap();
        assert!(!prepared.stripped);
        assert!(prepared.body.contains("base64Content"));
    }

    #[test]
    fn relay_is_preferred_over_direct() {
        assert_eq!(
            DeliveryTarget::resolve(Some("https://app/make-proxy"), Some("https://hook")),
            Some(DeliveryTarget::Relay("https://app/make-proxy".to_string()))
        );
        assert_eq!(
            DeliveryTarget::resolve(None, Some("https://hook")),
            Some(DeliveryTarget::Direct("https://hook".to_string()))
        );
        assert_eq!(DeliveryTarget::resolve(None, None), None);
    }

    fn payload() -> WebhookPayload {
        let record = sample_record();
        let artifacts = PersistedArtifacts {
            attachments: vec![],
            document: unpersisted(ArtifactKind::Document, "KT.pdf"),
            signature: None,
        };
        build_payload(
            &record,
            &sample_document(),
            &artifacts,
            TransportMode::Inline,
            analytics_payload(),
        )
    }

    #[tokio::test]
    async fn relay_rejection_is_an_error_outcome() {
        let http = Arc::new(MockHttpClient::responding(HttpResponse::new(502, "bad gateway")));
        let stage = DeliveryStage::new(
            http.clone(),
            DeliveryTarget::Relay("http://relay/make-proxy".to_string()),
            10_000_000,
        );

        let outcome = stage.deliver(payload()).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.request_id, "req_1719567000000_abcde");
        assert!(outcome.error.unwrap().contains("502"));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn direct_response_is_opaque() {
        let http = Arc::new(MockHttpClient::responding(HttpResponse::new(500, "")));
        let stage = DeliveryStage::new(
            http.clone(),
            DeliveryTarget::Direct("https://hook.example".to_string()),
            10_000_000,
        );

        let outcome = stage.deliver(payload()).await;

        assert!(outcome.is_sent());
        assert!(outcome.payload_chars > 0);
        let (url, body) = &http.requests()[0];
        assert_eq!(url, "https://hook.example");
        assert_eq!(body.chars().count(), outcome.payload_chars);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_even_when_opaque() {
        let http = Arc::new(MockHttpClient::unreachable());
        let stage = DeliveryStage::new(
            http,
            DeliveryTarget::Direct("https://hook.example".to_string()),
            10_000_000,
        );

        let outcome = stage.deliver(payload()).await;

        assert!(!outcome.is_sent());
        assert!(outcome.error.unwrap().contains("transport"));
    }

    #[test]
    fn delivery_errors_map_to_app_errors() {
        let err: AppError = DeliveryError::Rejected {
            status: 503,
            body: "down".to_string(),
        }
        .into();
        assert_eq!(err.error_type(), "Delivery");
    }
}

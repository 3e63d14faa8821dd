//! Test doubles shared by the unit tests of this crate.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use ktform_core::models::{
    AccessAction, AccessEntry, AnalyticsPayload, ArtifactKind, ArtifactMetadata, Contact,
    FormFields, GeneratedDocument, PerformanceMetrics, RemoteReference, SubmissionRecord,
    UploadResult,
};
use ktform_core::StorageBackend;
use ktform_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::http::{HttpClient, HttpResponse, TransportError};

/// 1x1 RGBA PNG.
pub const SIGNATURE_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn sample_record() -> SubmissionRecord {
    SubmissionRecord::new(
        FormFields {
            employee_name: "Jane Doe".to_string(),
            designation: "Engineer".to_string(),
            department: "Platform".to_string(),
            reporting_manager_name: "Alex Lead".to_string(),
            reporting_manager_email: "alex@example.com".to_string(),
            employee_id: "E-1001".to_string(),
            date_of_joining: "2019-04-01".to_string(),
            last_working_day: "2024-06-30".to_string(),
            current_responsibilities: "Billing service".to_string(),
            employee_signature_date: "2024-06-28".to_string(),
            ..Default::default()
        },
        vec![Contact {
            name: "Sam Successor".to_string(),
            email: "sam@example.com".to_string(),
        }],
        vec![AccessEntry {
            credentials: "VPN".to_string(),
            action: AccessAction::TransferAndDeactivate,
        }],
        vec![],
        Some(SIGNATURE_DATA_URL.to_string()),
        Utc.with_ymd_and_hms(2024, 6, 28, 9, 30, 0).unwrap(),
    )
}

pub fn sample_document() -> GeneratedDocument {
    GeneratedDocument::new(
        "KT_Form_Jane_Doe_2024-06-28.pdf",
        Bytes::from_static(b"%PDF-1.5 test document"),
        1,
    )
}

pub fn analytics_payload() -> AnalyticsPayload {
    AnalyticsPayload {
        session_id: "kt_1719567000000_abcdefghi".to_string(),
        submission_time: Utc.with_ymd_and_hms(2024, 6, 28, 9, 30, 0).unwrap(),
        performance_metrics: PerformanceMetrics::default(),
        request_id: "req_1719567000000_abcde".to_string(),
    }
}

fn metadata(kind: ArtifactKind, file_name: &str) -> ArtifactMetadata {
    ArtifactMetadata {
        kind,
        file_name: file_name.to_string(),
        size_bytes: 1,
        mime_type: "application/octet-stream".to_string(),
    }
}

pub fn persisted(kind: ArtifactKind, file_name: &str) -> UploadResult {
    let key = format!("kt-forms/1719567000000-{}", file_name);
    UploadResult::persisted(
        metadata(kind, file_name),
        RemoteReference {
            url: format!("https://bucket.s3.us-east-1.amazonaws.com/{}", key),
            key,
        },
    )
}

pub fn unpersisted(kind: ArtifactKind, file_name: &str) -> UploadResult {
    UploadResult::unpersisted(metadata(kind, file_name))
}

/// In-memory store; keys ending in `fail_suffix` are refused.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_suffix: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, suffix: &str) -> Self {
        self.fail_suffix = Some(suffix.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        if let Some(suffix) = &self.fail_suffix {
            if storage_key.ends_with(suffix.as_str()) {
                return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
            }
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data.to_vec());
        Ok(format!("https://bucket.s3.us-east-1.amazonaws.com/{}", storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Records every request and answers with a canned response.
pub struct MockHttpClient {
    response: Result<HttpResponse, TransportError>,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockHttpClient {
    pub fn responding(response: HttpResponse) -> Self {
        Self {
            response: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            response: Err(TransportError("connection refused".to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, url: &str, body: String) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body));
        self.response.clone()
    }
}

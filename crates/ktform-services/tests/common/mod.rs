//! Shared doubles for the pipeline scenarios.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use ktform_core::models::{AccessAction, AccessRow, ContactRow, FormFields, FormState};
use ktform_core::StorageBackend;
use ktform_services::{
    DeliveryStage, DeliveryTarget, HttpClient, HttpResponse, SubmissionOrchestrator,
    TransportError, UploadStage,
};
use ktform_processing::PdfRenderer;
use ktform_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SIGNATURE_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const WEBHOOK_URL: &str = "https://hook.example.com/abc";

pub fn minimal_form() -> FormState {
    FormState {
        fields: FormFields {
            employee_name: "Jane Doe".to_string(),
            designation: "Engineer".to_string(),
            department: "Platform".to_string(),
            reporting_manager_name: "Alex Lead".to_string(),
            reporting_manager_email: "alex@example.com".to_string(),
            employee_id: "E-1001".to_string(),
            date_of_joining: "2019-04-01".to_string(),
            last_working_day: "2024-06-30".to_string(),
            current_responsibilities: "Owns billing".to_string(),
            employee_signature_date: "2024-06-28".to_string(),
            ..Default::default()
        },
        contacts: vec![ContactRow::new("Sam Successor", "sam@example.com")],
        access_entries: vec![AccessRow::new("VPN", Some(AccessAction::Transfer))],
        signature: Some(SIGNATURE_DATA_URL.to_string()),
    }
}

pub fn orchestrator(
    storage: Option<Arc<dyn Storage>>,
    http: Arc<RecordingHttpClient>,
    max_payload_chars: usize,
) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(
        Arc::new(PdfRenderer::new(Some("Acme Corp".to_string()))),
        UploadStage::new(storage),
        DeliveryStage::new(
            http,
            DeliveryTarget::Direct(WEBHOOK_URL.to_string()),
            max_payload_chars,
        ),
    )
}

/// Object store that refuses keys ending in a given suffix.
#[derive(Default)]
pub struct FlakyStorage {
    objects: Mutex<HashMap<String, usize>>,
    fail_suffix: Option<String>,
}

impl FlakyStorage {
    pub fn reliable() -> Self {
        Self::default()
    }

    pub fn failing_on(suffix: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_suffix: Some(suffix.to_string()),
        }
    }

    pub fn stored_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        if let Some(suffix) = &self.fail_suffix {
            if storage_key.ends_with(suffix.as_str()) {
                return Err(StorageError::UploadFailed("access denied".to_string()));
            }
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data.len());
        Ok(format!("https://kt-bucket.s3.eu-west-1.amazonaws.com/{}", storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Accepts every request and keeps the bodies for inspection.
#[derive(Default)]
pub struct RecordingHttpClient {
    bodies: Mutex<Vec<String>>,
}

impl RecordingHttpClient {
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn last_json(&self) -> serde_json::Value {
        let bodies = self.bodies();
        let body = bodies.last().expect("no request was sent");
        serde_json::from_str(body).unwrap()
    }
}

#[async_trait]
impl HttpClient for RecordingHttpClient {
    async fn post(&self, _url: &str, body: String) -> Result<HttpResponse, TransportError> {
        self.bodies.lock().unwrap().push(body);
        Ok(HttpResponse::new(200, "Accepted"))
    }
}

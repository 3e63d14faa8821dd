//! Durable upload stage
//!
//! Best-effort persistence of every binary artifact of a submission. Each upload is
//! isolated: a failure is logged and recorded but never aborts the others, and the
//! caller decides the transport mode from the combined result.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use ktform_core::constants::{PDF_CONTENT_TYPE, SIGNATURE_CONTENT_TYPE};
use ktform_core::models::{
    ArtifactKind, ArtifactMetadata, GeneratedDocument, PersistedArtifacts, PersistenceFailure,
    RemoteReference, SubmissionRecord, UploadResult,
};
use ktform_processing::decode_data_url;
use ktform_storage::keys::{sanitize_filename, signature_file_name, storage_key_at};
use ktform_storage::Storage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// What the upload stage produced: one result per artifact plus the failures to log.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub artifacts: PersistedArtifacts,
    pub failures: Vec<PersistenceFailure>,
}

struct PendingUpload {
    metadata: ArtifactMetadata,
    key: String,
    content: Result<Bytes, String>,
}

#[derive(Clone)]
pub struct UploadStage {
    storage: Option<Arc<dyn Storage>>,
}

impl std::fmt::Debug for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadStage")
            .field(
                "backend",
                &self.storage.as_ref().map(|s| s.backend_type()),
            )
            .finish()
    }
}

impl UploadStage {
    pub fn new(storage: Option<Arc<dyn Storage>>) -> Self {
        Self { storage }
    }

    pub fn is_configured(&self) -> bool {
        self.storage.is_some()
    }

    /// Persist attachments, the summary document and the signature concurrently.
    ///
    /// With no storage configured nothing is attempted and every result is unpersisted.
    #[tracing::instrument(skip_all, fields(attachments = record.attachments.len()))]
    pub async fn persist_all(
        &self,
        record: &SubmissionRecord,
        document: &GeneratedDocument,
    ) -> UploadReport {
        let now = Utc::now();
        let pending = pending_uploads(record, document, now);

        let Some(storage) = self.storage.as_deref() else {
            tracing::info!("Object storage not configured, artifacts will travel inline");
            return assemble(pending, |p| (UploadResult::unpersisted(p.metadata), None));
        };

        let start = Instant::now();
        let outcomes = join_all(pending.iter().map(|p| store(storage, p))).await;

        let mut outcomes = outcomes.into_iter();
        let report = assemble(pending, |p| match outcomes.next() {
            Some(Ok(reference)) => (UploadResult::persisted(p.metadata, reference), None),
            Some(Err((stage, error))) => {
                let failure = PersistenceFailure {
                    artifact: p.metadata.file_name.clone(),
                    kind: p.metadata.kind,
                    stage: stage.to_string(),
                    error,
                    timestamp: Utc::now(),
                };
                (UploadResult::unpersisted(p.metadata), Some(failure))
            }
            None => (UploadResult::unpersisted(p.metadata), None),
        });

        tracing::info!(
            persisted = report.artifacts.iter().filter(|r| r.is_persisted()).count(),
            failed = report.failures.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload stage finished"
        );

        report
    }
}

async fn store(
    storage: &dyn Storage,
    pending: &PendingUpload,
) -> Result<RemoteReference, (&'static str, String)> {
    let content = match &pending.content {
        Ok(content) => content.clone(),
        Err(error) => {
            tracing::warn!(
                artifact = %pending.metadata.file_name,
                kind = %pending.metadata.kind,
                stage = "decode",
                error = %error,
                "Artifact could not be decoded for upload"
            );
            return Err(("decode", error.clone()));
        }
    };

    match storage
        .upload_with_key(&pending.key, content, &pending.metadata.mime_type)
        .await
    {
        Ok(url) => {
            tracing::debug!(
                artifact = %pending.metadata.file_name,
                key = %pending.key,
                "Artifact persisted"
            );
            Ok(RemoteReference {
                url,
                key: pending.key.clone(),
            })
        }
        Err(e) => {
            tracing::warn!(
                artifact = %pending.metadata.file_name,
                kind = %pending.metadata.kind,
                stage = "upload",
                error = %e,
                timestamp = %Utc::now().to_rfc3339(),
                "Artifact persistence failed"
            );
            Err(("upload", e.to_string()))
        }
    }
}

fn pending_uploads(
    record: &SubmissionRecord,
    document: &GeneratedDocument,
    now: DateTime<Utc>,
) -> Vec<PendingUpload> {
    let millis = now.timestamp_millis();
    let mut names = UniqueNames::default();
    let mut pending = Vec::with_capacity(record.attachments.len() + 2);

    for attachment in &record.attachments {
        let file_name = names.claim(&attachment.file_name);
        pending.push(PendingUpload {
            key: storage_key_at(millis, &file_name),
            metadata: ArtifactMetadata {
                kind: ArtifactKind::Attachment,
                file_name: attachment.file_name.clone(),
                size_bytes: attachment.size_bytes,
                mime_type: attachment.mime_type.clone(),
            },
            content: Ok(attachment.content.clone()),
        });
    }

    let document_name = names.claim(&document.file_name);
    pending.push(PendingUpload {
        key: storage_key_at(millis, &document_name),
        metadata: ArtifactMetadata {
            kind: ArtifactKind::Document,
            file_name: document.file_name.clone(),
            size_bytes: document.size_bytes(),
            mime_type: PDF_CONTENT_TYPE.to_string(),
        },
        content: Ok(document.content.clone()),
    });

    if let Some(signature) = record.signature.as_deref() {
        let file_name = signature_file_name(millis);
        let content = decode_data_url(signature)
            .map(Bytes::from)
            .map_err(|e| format!("invalid signature encoding: {}", e));
        pending.push(PendingUpload {
            key: storage_key_at(millis, &names.claim(&file_name)),
            metadata: ArtifactMetadata {
                kind: ArtifactKind::Signature,
                file_name,
                size_bytes: content.as_ref().map(|c| c.len() as u64).unwrap_or(0),
                mime_type: SIGNATURE_CONTENT_TYPE.to_string(),
            },
            content,
        });
    }

    pending
}

/// Rebuild the per-kind structure from the flat upload list.
fn assemble<F>(pending: Vec<PendingUpload>, mut resolve: F) -> UploadReport
where
    F: FnMut(PendingUpload) -> (UploadResult, Option<PersistenceFailure>),
{
    let mut attachments = Vec::new();
    let mut document = None;
    let mut signature = None;
    let mut failures = Vec::new();

    for item in pending {
        let kind = item.metadata.kind;
        let (result, failure) = resolve(item);
        failures.extend(failure);
        match kind {
            ArtifactKind::Attachment => attachments.push(result),
            ArtifactKind::Document => document = Some(result),
            ArtifactKind::Signature => signature = Some(result),
        }
    }

    UploadReport {
        artifacts: PersistedArtifacts {
            attachments,
            // pending_uploads always emits exactly one document entry
            document: document.unwrap_or_else(|| {
                UploadResult::unpersisted(ArtifactMetadata {
                    kind: ArtifactKind::Document,
                    file_name: String::new(),
                    size_bytes: 0,
                    mime_type: PDF_CONTENT_TYPE.to_string(),
                })
            }),
            signature,
        },
        failures,
    }
}

/// Keeps keys distinct when two artifacts of one submission share a file name.
///
/// Names are compared after sanitising, since that is what ends up in the key.
#[derive(Default)]
struct UniqueNames {
    seen: HashSet<String>,
}

impl UniqueNames {
    fn claim(&mut self, name: &str) -> String {
        let name = sanitize_filename(name);
        if self.seen.insert(name.clone()) {
            return name;
        }
        let (stem, ext) = match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
            _ => (name.as_str(), ""),
        };
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}{}", stem, n, ext);
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_document, sample_record, MemoryStorage};
    use ktform_core::models::{Attachment, TransportMode};

    #[tokio::test]
    async fn everything_persists_under_the_key_prefix() {
        let storage = Arc::new(MemoryStorage::new());
        let stage = UploadStage::new(Some(storage.clone() as Arc<dyn Storage>));
        let mut record = sample_record();
        record.attachments = vec![Attachment::new(
            "notes.txt",
            "text/plain",
            Bytes::from_static(b"hello"),
        )];

        let report = stage.persist_all(&record, &sample_document()).await;

        assert!(report.failures.is_empty());
        assert_eq!(report.artifacts.transport_mode(), TransportMode::Remote);
        assert_eq!(storage.len(), 3);
        for result in report.artifacts.iter() {
            let reference = result.reference.as_ref().unwrap();
            assert!(reference.key.starts_with("kt-forms/"));
            assert!(reference.url.ends_with(&reference.key));
        }
        let signature = report.artifacts.signature.as_ref().unwrap();
        assert!(signature.metadata.file_name.starts_with("signature-"));
        assert!(signature.metadata.file_name.ends_with(".png"));
        assert_eq!(
            storage.get(&signature.reference.as_ref().unwrap().key).unwrap(),
            decode_data_url(record.signature.as_deref().unwrap()).unwrap()
        );
    }

    #[tokio::test]
    async fn one_failure_is_isolated_and_recorded() {
        let storage = Arc::new(MemoryStorage::new().failing_on(".pdf"));
        let stage = UploadStage::new(Some(storage as Arc<dyn Storage>));

        let report = stage.persist_all(&sample_record(), &sample_document()).await;

        assert!(!report.artifacts.document.is_persisted());
        assert!(report.artifacts.signature.as_ref().unwrap().is_persisted());
        assert_eq!(report.artifacts.transport_mode(), TransportMode::Inline);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, ArtifactKind::Document);
        assert_eq!(report.failures[0].stage, "upload");
    }

    #[tokio::test]
    async fn unconfigured_storage_attempts_nothing() {
        let stage = UploadStage::new(None);
        let report = stage.persist_all(&sample_record(), &sample_document()).await;

        assert!(!stage.is_configured());
        assert!(report.failures.is_empty());
        assert_eq!(report.artifacts.failed_count(), 2);
        assert_eq!(report.artifacts.transport_mode(), TransportMode::Inline);
    }

    #[tokio::test]
    async fn undecodable_signature_fails_only_itself() {
        let storage = Arc::new(MemoryStorage::new());
        let stage = UploadStage::new(Some(storage as Arc<dyn Storage>));
        let mut record = sample_record();
        record.signature = Some("data:image/png;base64,%%%".to_string());

        let report = stage.persist_all(&record, &sample_document()).await;

        assert!(report.artifacts.document.is_persisted());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, "decode");
    }

    #[tokio::test]
    async fn shared_file_names_get_distinct_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let stage = UploadStage::new(Some(storage.clone() as Arc<dyn Storage>));
        let mut record = sample_record();
        record.attachments = vec![
            Attachment::new("report.pdf", "application/pdf", Bytes::from_static(b"a")),
            Attachment::new("report.pdf", "application/pdf", Bytes::from_static(b"bb")),
        ];

        let report = stage.persist_all(&record, &sample_document()).await;

        let keys: Vec<_> = report
            .artifacts
            .attachments
            .iter()
            .map(|r| r.reference.as_ref().unwrap().key.clone())
            .collect();
        assert_ne!(keys[0], keys[1]);
        assert!(keys[1].ends_with("-report-1.pdf"));
        assert_eq!(report.artifacts.attachments[1].metadata.file_name, "report.pdf");
        assert_eq!(storage.len(), 4);
    }

    #[tokio::test]
    async fn names_that_sanitise_alike_get_distinct_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let stage = UploadStage::new(Some(storage.clone() as Arc<dyn Storage>));
        let mut record = sample_record();
        record.attachments = vec![
            Attachment::new("q3/plan.pdf", "application/pdf", Bytes::from_static(b"a")),
            Attachment::new("q3_plan.pdf", "application/pdf", Bytes::from_static(b"bb")),
        ];

        let report = stage.persist_all(&record, &sample_document()).await;

        let keys: Vec<_> = report
            .artifacts
            .attachments
            .iter()
            .map(|r| r.reference.as_ref().unwrap().key.clone())
            .collect();
        assert!(keys[0].ends_with("-q3_plan.pdf"));
        assert!(keys[1].ends_with("-q3_plan-1.pdf"));
        assert_eq!(storage.get(&keys[0]).unwrap(), b"a".to_vec());
        assert_eq!(storage.get(&keys[1]).unwrap(), b"bb".to_vec());
        assert_eq!(report.artifacts.attachments[0].metadata.file_name, "q3/plan.pdf");
        assert_eq!(storage.len(), 4);
    }
}

//! Submission orchestrator
//!
//! Sequences collection, rendering, persistence and delivery for one form session.
//! The state cell doubles as the re-entry guard: while a submission is in flight any
//! further trigger is ignored.

use chrono::{DateTime, Utc};
use ktform_core::models::{
    AnalyticsPayload, AnalyticsSnapshot, Attachment, FormState, TransportMode,
};
use ktform_core::{
    collect, AddReport, AppError, AttachmentAccumulator, Config, ErrorMetadata, ValidationErrors,
};
use ktform_processing::{DocumentRenderer, PdfRenderer};
use ktform_storage::Storage;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::analytics::SessionAnalytics;
use crate::delivery::{build_payload, DeliveryStage, DeliveryTarget};
use crate::http::HttpClient;
use crate::ids::request_id;
use crate::upload::UploadStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Collecting,
    Generating,
    Persisting,
    Delivering,
    Succeeded,
    Failed,
}

impl Display for SubmissionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Collecting => "collecting",
            SubmissionState::Generating => "generating",
            SubmissionState::Persisting => "persisting",
            SubmissionState::Delivering => "delivering",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Confirmation handed back after a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub request_id: String,
    pub submitted_at: DateTime<Utc>,
    pub document_file_name: String,
    pub transport_mode: TransportMode,
    pub payload_chars: usize,
    pub latency_ms: u64,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Another submission was already in flight.
    Ignored,
    Invalid(ValidationErrors),
    Failed {
        stage: SubmissionState,
        error: AppError,
    },
    Succeeded(SubmissionReceipt),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded(_))
    }

    /// Text suitable for the person filling in the form.
    pub fn user_message(&self) -> Option<String> {
        match self {
            SubmissionOutcome::Ignored => None,
            SubmissionOutcome::Invalid(errors) => Some(errors.to_string()),
            SubmissionOutcome::Failed { error, .. } => Some(error.client_message()),
            SubmissionOutcome::Succeeded(receipt) => Some(format!(
                "Form submitted successfully on {}",
                receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
            )),
        }
    }
}

/// User-facing feedback sink. Every method defaults to doing nothing.
pub trait SubmissionFeedback: Send + Sync {
    fn state_changed(&self, _state: SubmissionState) {}
    fn validation_failed(&self, _errors: &ValidationErrors) {}
    fn failed(&self, _message: &str) {}
    fn succeeded(&self, _receipt: &SubmissionReceipt) {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SubmissionOrchestrator {
    state: Mutex<SubmissionState>,
    accumulator: Mutex<AttachmentAccumulator>,
    analytics: Mutex<SessionAnalytics>,
    renderer: Arc<dyn DocumentRenderer>,
    upload: UploadStage,
    delivery: DeliveryStage,
    feedback: Option<Arc<dyn SubmissionFeedback>>,
}

impl std::fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SubmissionOrchestrator")
            .field("state", &self.state())
            .field("upload", &self.upload)
            .field("delivery", &self.delivery)
            .finish()
    }
}

/// Returns the orchestrator to `Idle` however the submission ends.
struct ActiveSubmission<'a> {
    orchestrator: &'a SubmissionOrchestrator,
}

impl Drop for ActiveSubmission<'_> {
    fn drop(&mut self) {
        self.orchestrator.transition(SubmissionState::Idle);
    }
}

impl SubmissionOrchestrator {
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        upload: UploadStage,
        delivery: DeliveryStage,
    ) -> Self {
        Self {
            state: Mutex::new(SubmissionState::Idle),
            accumulator: Mutex::new(AttachmentAccumulator::default()),
            analytics: Mutex::new(SessionAnalytics::new()),
            renderer,
            upload,
            delivery,
            feedback: None,
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(
        config: &Config,
        storage: Option<Arc<dyn Storage>>,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, AppError> {
        let target = DeliveryTarget::from_config(config)?;
        let renderer = PdfRenderer::new(config.organization_name().map(str::to_string));

        tracing::info!(
            target = %target,
            storage = storage.is_some(),
            max_payload_chars = config.max_payload_chars(),
            "Submission pipeline configured"
        );

        Ok(Self::new(
            Arc::new(renderer),
            UploadStage::new(storage),
            DeliveryStage::new(http, target, config.max_payload_chars()),
        )
        .with_accumulator(AttachmentAccumulator::new(config.max_attachment_bytes())))
    }

    pub fn with_accumulator(mut self, accumulator: AttachmentAccumulator) -> Self {
        self.accumulator = Mutex::new(accumulator);
        self
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn SubmissionFeedback>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn state(&self) -> SubmissionState {
        *lock(&self.state)
    }

    pub fn add_attachments<I>(&self, files: I) -> AddReport
    where
        I: IntoIterator<Item = Attachment>,
    {
        lock(&self.accumulator).add(files)
    }

    pub fn remove_attachment(&self, index: usize) -> Option<Attachment> {
        lock(&self.accumulator).remove(index)
    }

    pub fn clear_attachments(&self) {
        lock(&self.accumulator).clear();
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        lock(&self.accumulator).snapshot()
    }

    /// Record that the front end finished loading.
    pub fn mark_ready(&self) {
        lock(&self.analytics).mark_ready();
    }

    pub fn analytics(&self) -> AnalyticsSnapshot {
        lock(&self.analytics).export()
    }

    fn transition(&self, next: SubmissionState) {
        let previous = std::mem::replace(&mut *lock(&self.state), next);
        tracing::debug!(from = %previous, to = %next, "Submission state changed");
        if let Some(feedback) = &self.feedback {
            feedback.state_changed(next);
        }
    }

    fn begin(&self) -> Option<ActiveSubmission<'_>> {
        {
            let mut state = lock(&self.state);
            if *state != SubmissionState::Idle {
                return None;
            }
            *state = SubmissionState::Collecting;
        }
        if let Some(feedback) = &self.feedback {
            feedback.state_changed(SubmissionState::Collecting);
        }
        Some(ActiveSubmission { orchestrator: self })
    }

    fn fail(&self, stage: SubmissionState, error: AppError) -> SubmissionOutcome {
        tracing::error!(
            stage = %stage,
            error_type = %error.error_type(),
            error = %error.detailed_message(),
            "Submission failed"
        );
        self.transition(SubmissionState::Failed);
        if let Some(feedback) = &self.feedback {
            feedback.failed(&error.client_message());
        }
        SubmissionOutcome::Failed { stage, error }
    }

    /// Run one submission end to end.
    #[tracing::instrument(skip(self, form))]
    pub async fn submit(&self, form: &FormState) -> SubmissionOutcome {
        let Some(_active) = self.begin() else {
            tracing::warn!("Submission already in progress, ignoring trigger");
            return SubmissionOutcome::Ignored;
        };

        let attachments = lock(&self.accumulator).snapshot();
        let record = match collect(form, &attachments, Utc::now()) {
            Ok(record) => record,
            Err(errors) => {
                tracing::info!(errors = %errors, "Form validation failed");
                self.transition(SubmissionState::Failed);
                if let Some(feedback) = &self.feedback {
                    feedback.validation_failed(&errors);
                }
                return SubmissionOutcome::Invalid(errors);
            }
        };

        self.transition(SubmissionState::Generating);
        let document = match self.renderer.render(&record) {
            Ok(document) => document,
            Err(e) => {
                lock(&self.analytics).record_error();
                return self.fail(SubmissionState::Generating, e.into());
            }
        };

        self.transition(SubmissionState::Persisting);
        let report = self.upload.persist_all(&record, &document).await;
        let mode = report.artifacts.transport_mode();
        if !report.failures.is_empty() {
            tracing::warn!(
                failed = report.failures.len(),
                "Some artifacts could not be persisted, sending everything inline"
            );
        }
        lock(&self.analytics).record_persistence_failures(report.failures);

        self.transition(SubmissionState::Delivering);
        let analytics = {
            let analytics = lock(&self.analytics);
            AnalyticsPayload {
                session_id: analytics.session_id().to_string(),
                submission_time: Utc::now(),
                performance_metrics: analytics.performance_metrics().clone(),
                request_id: request_id(Utc::now()),
            }
        };
        let payload = build_payload(&record, &document, &report.artifacts, mode, analytics);
        let outcome = self.delivery.deliver(payload).await;
        lock(&self.analytics).record_outcome(outcome.clone());

        if !outcome.is_sent() {
            let message = outcome
                .error
                .unwrap_or_else(|| "webhook delivery failed".to_string());
            return self.fail(SubmissionState::Delivering, AppError::Delivery(message));
        }

        lock(&self.accumulator).clear();
        let receipt = SubmissionReceipt {
            request_id: outcome.request_id,
            submitted_at: record.submission_date,
            document_file_name: document.file_name,
            transport_mode: mode,
            payload_chars: outcome.payload_chars,
            latency_ms: outcome.latency_ms,
        };

        tracing::info!(
            request_id = %receipt.request_id,
            transport_mode = ?receipt.transport_mode,
            payload_chars = receipt.payload_chars,
            "Submission succeeded"
        );
        self.transition(SubmissionState::Succeeded);
        if let Some(feedback) = &self.feedback {
            feedback.succeeded(&receipt);
        }

        SubmissionOutcome::Succeeded(receipt)
    }
}

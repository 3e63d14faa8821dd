//! Per-session analytics.
//!
//! Counts submissions and errors, keeps the delivery outcome log and the persistence
//! failure log, and snapshots the runtime environment for the payload.

use chrono::{DateTime, Utc};
use ktform_core::models::{
    AnalyticsSnapshot, DeliveryOutcome, OutcomeStatus, PerformanceMetrics, PersistenceFailure,
};
use std::time::Instant;

use crate::ids::session_id;

#[derive(Debug, Clone)]
pub struct SessionAnalytics {
    session_id: String,
    session_start: DateTime<Utc>,
    started: Instant,
    form_submissions: u64,
    form_errors: u64,
    webhook_responses: Vec<DeliveryOutcome>,
    persistence_failures: Vec<PersistenceFailure>,
    performance_metrics: PerformanceMetrics,
}

impl Default for SessionAnalytics {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAnalytics {
    pub fn new() -> Self {
        let now = Utc::now();
        let session_id = session_id(now);
        tracing::info!(session_id = %session_id, "Analytics session started");

        Self {
            performance_metrics: PerformanceMetrics {
                session_id: session_id.clone(),
                ..Default::default()
            },
            session_id,
            session_start: now,
            started: Instant::now(),
            form_submissions: 0,
            form_errors: 0,
            webhook_responses: Vec::new(),
            persistence_failures: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    pub fn form_submissions(&self) -> u64 {
        self.form_submissions
    }

    pub fn form_errors(&self) -> u64 {
        self.form_errors
    }

    pub fn webhook_responses(&self) -> &[DeliveryOutcome] {
        &self.webhook_responses
    }

    pub fn persistence_failures(&self) -> &[PersistenceFailure] {
        &self.persistence_failures
    }

    /// Capture the environment once the front end is ready for input.
    pub fn mark_ready(&mut self) {
        self.performance_metrics = PerformanceMetrics {
            load_time_ms: self.started.elapsed().as_millis() as u64,
            timestamp: Some(Utc::now()),
            user_agent: format!("ktform/{}", env!("CARGO_PKG_VERSION")),
            host: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
            session_id: self.session_id.clone(),
        };

        tracing::debug!(
            session_id = %self.session_id,
            load_time_ms = self.performance_metrics.load_time_ms,
            host = %self.performance_metrics.host,
            "Performance tracked"
        );
    }

    pub fn performance_metrics(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Append a delivery outcome and bump the matching counter.
    pub fn record_outcome(&mut self, outcome: DeliveryOutcome) {
        match outcome.status {
            OutcomeStatus::Sent => self.form_submissions += 1,
            OutcomeStatus::Error => self.form_errors += 1,
        }
        self.webhook_responses.push(outcome);
    }

    /// Count a failure that happened before anything reached the network.
    pub fn record_error(&mut self) {
        self.form_errors += 1;
    }

    pub fn record_persistence_failures(&mut self, failures: impl IntoIterator<Item = PersistenceFailure>) {
        self.persistence_failures.extend(failures);
    }

    pub fn export(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            session_id: self.session_id.clone(),
            session_start: self.session_start,
            form_submissions: self.form_submissions,
            form_errors: self.form_errors,
            webhook_responses: self.webhook_responses.clone(),
            persistence_failures: self.persistence_failures.clone(),
            performance_metrics: self.performance_metrics.clone(),
        }
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::ArtifactKind;

/// Environment snapshot attached to every payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub load_time_ms: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub user_agent: String,
    pub host: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Sent,
    Error,
}

impl Display for OutcomeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutcomeStatus::Sent => write!(f, "sent"),
            OutcomeStatus::Error => write!(f, "error"),
        }
    }
}

/// One webhook delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub request_id: String,
    pub status: OutcomeStatus,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
    pub payload_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        self.status == OutcomeStatus::Sent
    }
}

/// One artifact that could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceFailure {
    pub artifact: String,
    pub kind: ArtifactKind,
    pub stage: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Exported view of a session's analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub session_id: String,
    pub session_start: DateTime<Utc>,
    pub form_submissions: u64,
    pub form_errors: u64,
    pub webhook_responses: Vec<DeliveryOutcome>,
    pub persistence_failures: Vec<PersistenceFailure>,
    pub performance_metrics: PerformanceMetrics,
}

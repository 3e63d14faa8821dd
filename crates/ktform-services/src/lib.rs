//! ktform Services Library
//!
//! The submission pipeline: best-effort durable upload, webhook delivery with a size
//! fallback, session analytics and the orchestrator that sequences them.

pub mod analytics;
pub mod delivery;
pub mod http;
pub mod ids;
pub mod orchestrator;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analytics::SessionAnalytics;
pub use delivery::{build_payload, prepare_body, DeliveryError, DeliveryStage, DeliveryTarget};
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};
pub use orchestrator::{
    SubmissionFeedback, SubmissionOrchestrator, SubmissionOutcome, SubmissionReceipt,
    SubmissionState,
};
pub use upload::{UploadReport, UploadStage};

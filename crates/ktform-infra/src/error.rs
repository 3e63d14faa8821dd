//! HTTP error response body
//!
//! The `IntoResponse` wrapper lives in the binary crate: axum's trait and
//! `ktform_core::AppError` are both foreign here.

use ktform_core::{AppError, ErrorMetadata};
use serde::Serialize;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            error_type: None,
            code: code.into(),
            recoverable: false,
            suggested_action: None,
        }
    }

    /// Build the body for `error`; details are only included when `expose_details` is set
    /// and the error is not sensitive.
    pub fn from_app_error(error: &AppError, expose_details: bool) -> Self {
        let show = expose_details && !error.is_sensitive();
        Self {
            error: error.client_message(),
            details: show.then(|| error.detailed_message()),
            error_type: show.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

//! Error types module
//!
//! Every failure the submission pipeline can surface is unified under [`AppError`].
//! Stage-specific crates keep their own `thiserror` enums (storage, delivery) and convert
//! into `AppError` at the orchestrator boundary.

use crate::validation::ValidationErrors;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a failed artifact upload
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DELIVERY_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Generic message shown whenever a submission fails past validation.
pub const RETRY_MESSAGE: &str =
    "There was an error submitting the form. Please try again or contact HR.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Artifact generation error: {0}")]
    ArtifactGeneration(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation(_) => (
            422,
            "VALIDATION_ERROR",
            false,
            Some("Correct the highlighted fields and submit again"),
            false,
            LogLevel::Debug,
        ),
        AppError::ArtifactGeneration(_) => (
            500,
            "ARTIFACT_GENERATION_ERROR",
            false,
            Some("Contact HR if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::Persistence(_) => (
            502,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Warn,
        ),
        AppError::Delivery(_) => (
            502,
            "DELIVERY_ERROR",
            true,
            Some("Retry after a short delay or contact HR"),
            true,
            LogLevel::Error,
        ),
        AppError::Config(_) => (
            500,
            "CONFIG_ERROR",
            false,
            Some("Check the service configuration"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::ArtifactGeneration(_) => "ArtifactGeneration",
            AppError::Persistence(_) => "Persistence",
            AppError::Delivery(_) => "Delivery",
            AppError::Config(_) => "Config",
            AppError::InvalidInput(_) => "InvalidInput",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref errors) => errors.to_string(),
            AppError::ArtifactGeneration(_)
            | AppError::Persistence(_)
            | AppError::Delivery(_)
            | AppError::Config(_) => RETRY_MESSAGE.to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldError;

    #[test]
    fn delivery_errors_hide_details_behind_retry_message() {
        let err = AppError::Delivery("upstream returned 503".to_string());
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.error_code(), "DELIVERY_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), RETRY_MESSAGE);
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn validation_errors_are_user_facing() {
        let err = AppError::from(ValidationErrors::new(vec![FieldError::new(
            "employeeName",
            "This field is required",
        )]));
        assert_eq!(err.http_status_code(), 422);
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("employeeName"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn malformed_json_is_invalid_input() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = AppError::from(source);
        assert_eq!(err.error_type(), "InvalidInput");
        assert_eq!(err.http_status_code(), 400);
        assert!(err.client_message().starts_with("JSON parsing error"));
        assert!(!err.is_sensitive());
    }

    #[test]
    fn persistence_is_recoverable_warning() {
        let err = AppError::Persistence("bucket unreachable".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert_eq!(
            err.suggested_action(),
            Some("Retry after a short delay")
        );
    }
}

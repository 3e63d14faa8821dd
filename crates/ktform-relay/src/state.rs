use ktform_services::HttpClient;
use std::sync::Arc;

/// Shared state handed to every relay handler.
#[derive(Clone)]
pub struct RelayState {
    pub http: Arc<dyn HttpClient>,
    pub webhook_url: String,
    /// Include error details in JSON error bodies (never in production).
    pub expose_error_details: bool,
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("webhook_url", &self.webhook_url)
            .field("expose_error_details", &self.expose_error_details)
            .finish()
    }
}

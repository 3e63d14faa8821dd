//! ktform Infrastructure Library
//!
//! Shared pieces for the HTTP-facing binaries:
//! - Middleware (request ID, security headers)
//! - Tracing subscriber initialization
//! - Error response body

#[cfg(feature = "middleware")]
pub mod middleware;

pub mod telemetry;

pub mod error;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
};

pub use telemetry::{init_telemetry, TelemetryFormat};

pub use error::ErrorResponse;

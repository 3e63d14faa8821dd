//! Relay endpoint: preflight, forward, and everything else rejected.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use ktform_core::AppError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::error::HttpAppError;
use crate::state::RelayState;

/// Envelope returned for every upstream response, whatever its status.
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub success: bool,
    pub status: u16,
    pub message: String,
}

pub async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type, Authorization"),
            ),
            (
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static("86400"),
            ),
        ],
    )
        .into_response()
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method Not Allowed" })),
    )
        .into_response()
}

/// Forward a JSON submission to the webhook and mirror its status.
#[tracing::instrument(skip(state, body), fields(body_bytes = body.len()))]
pub async fn relay_submission(
    State(state): State<Arc<RelayState>>,
    body: Bytes,
) -> Result<Response, HttpAppError> {
    if let Err(e) = serde_json::from_slice::<serde_json::Value>(&body) {
        return Err(HttpAppError::new(
            AppError::from(e),
            state.expose_error_details,
        ));
    }
    // Valid JSON is always valid UTF-8.
    let body = String::from_utf8_lossy(&body).into_owned();

    let start = Instant::now();
    match state.http.post(&state.webhook_url, body).await {
        Ok(upstream) => {
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            tracing::info!(
                upstream_status = upstream.status,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Submission relayed"
            );
            let envelope = RelayResponse {
                success: upstream.is_success(),
                status: upstream.status,
                message: upstream.body,
            };
            Ok((status, Json(envelope)).into_response())
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Relay to webhook failed"
            );
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Internal server error",
                    "message": e.to_string(),
                })),
            )
                .into_response())
        }
    }
}

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe; the relay holds no connections worth checking.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ktform-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

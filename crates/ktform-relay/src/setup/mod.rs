//! Relay wiring: state, routes and server

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use ktform_core::Config;
use ktform_services::ReqwestHttpClient;
use std::sync::Arc;

use crate::state::RelayState;

/// Build the relay router from configuration.
pub fn initialize_app(config: &Config) -> Result<axum::Router> {
    let webhook_url = config.require_webhook_url()?.to_string();
    let http = ReqwestHttpClient::from_config(config).context("Failed to build webhook client")?;

    let state = Arc::new(RelayState {
        http: Arc::new(http),
        webhook_url,
        expose_error_details: !config.is_production(),
    });

    tracing::info!(
        relay_path = %config.relay_path(),
        timeout_seconds = config.webhook_timeout_seconds(),
        "Relay initialized"
    );

    routes::setup_routes(config, state)
}

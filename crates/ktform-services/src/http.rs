//! Outbound HTTP seam.
//!
//! The pipeline and the relay only ever POST a JSON body and look at the status and
//! the response text, so that is the whole capability.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ktform_core::Config;
use reqwest::Client;
use std::time::Duration;

/// Status and body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (DNS, connect, TLS, timeout).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP transport failed: {0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST `body` as `application/json`.
    async fn post(&self, url: &str, body: String) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed client with a per-request timeout and a small keep-alive pool.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    user_agent: String,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client for webhook delivery")?;

        Ok(Self {
            client,
            user_agent: format!("ktform/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(Duration::from_secs(config.webhook_timeout_seconds()))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, url: &str, body: String) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError(format!("request to {} timed out", url))
                } else {
                    TransportError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("Failed to read response body"));

        Ok(HttpResponse { status, body })
    }
}

//! Configuration module
//!
//! Configuration is sourced from the environment (and an optional `.env` file). Object
//! storage settings are optional: when none are present the durable upload stage is
//! disabled and submissions fall back to inline transport.

use std::env;

use crate::constants::{DEFAULT_RELAY_PATH, MAX_ATTACHMENT_BYTES, MAX_PAYLOAD_CHARS};
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 3000;
const WEBHOOK_TIMEOUT_SECS: u64 = 30;
const RELAY_MAX_BODY_MB: usize = 16;
const BYTES_PER_MB: usize = 1024 * 1024;

/// Numeric variable, `None` when unset. A value that does not parse is an error.
fn parse_var<T: std::str::FromStr>(
    get: impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, anyhow::Error> {
    get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} must be a valid number", key))
        })
        .transpose()
}

/// Settings shared by every binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

/// Knowledge-transfer pipeline configuration
#[derive(Clone, Debug)]
pub struct KtFormConfig {
    pub base: BaseConfig,
    // Delivery
    pub webhook_url: Option<String>,
    pub relay_url: Option<String>,
    pub relay_path: String,
    pub relay_max_body_bytes: usize,
    pub webhook_timeout_seconds: u64,
    pub max_payload_chars: usize,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Form behaviour
    pub max_attachment_bytes: u64,
    pub organization_name: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<KtFormConfig>);

impl Config {
    fn inner(&self) -> &KtFormConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = KtFormConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    /// Build configuration from an arbitrary key lookup (used by tests and embedders).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = KtFormConfig::from_lookup(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.inner().webhook_url.as_deref()
    }

    /// Webhook URL, or an error naming the missing variable.
    pub fn require_webhook_url(&self) -> Result<&str, anyhow::Error> {
        self.webhook_url()
            .ok_or_else(|| anyhow::anyhow!("WEBHOOK_URL must be set to deliver submissions"))
    }

    pub fn relay_url(&self) -> Option<&str> {
        self.inner().relay_url.as_deref()
    }

    pub fn relay_path(&self) -> &str {
        &self.inner().relay_path
    }

    pub fn relay_max_body_bytes(&self) -> usize {
        self.inner().relay_max_body_bytes
    }

    pub fn webhook_timeout_seconds(&self) -> u64 {
        self.inner().webhook_timeout_seconds
    }

    pub fn max_payload_chars(&self) -> usize {
        self.inner().max_payload_chars
    }

    pub fn max_attachment_bytes(&self) -> u64 {
        self.inner().max_attachment_bytes
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.inner().organization_name.as_deref()
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn aws_access_key_id(&self) -> Option<&str> {
        self.inner().aws_access_key_id.as_deref()
    }

    pub fn aws_secret_access_key(&self) -> Option<&str> {
        self.inner().aws_secret_access_key.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }
}

impl KtFormConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match get("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(value) => Some(value.parse::<StorageBackend>()?),
            None if get("S3_BUCKET").is_some() => Some(StorageBackend::S3),
            None if get("LOCAL_STORAGE_PATH").is_some() => Some(StorageBackend::Local),
            None => None,
        };

        let max_attachment_bytes = match parse_var::<u64>(&get, "MAX_ATTACHMENT_SIZE_MB")? {
            Some(mb) => mb
                .checked_mul(BYTES_PER_MB as u64)
                .ok_or_else(|| anyhow::anyhow!("MAX_ATTACHMENT_SIZE_MB is too large"))?,
            None => MAX_ATTACHMENT_BYTES,
        };

        let relay_max_body_bytes = parse_var::<usize>(&get, "RELAY_MAX_BODY_MB")?
            .unwrap_or(RELAY_MAX_BODY_MB)
            .checked_mul(BYTES_PER_MB)
            .ok_or_else(|| anyhow::anyhow!("RELAY_MAX_BODY_MB is too large"))?;

        let webhook_timeout_seconds =
            parse_var(&get, "WEBHOOK_TIMEOUT_SECONDS")?.unwrap_or(WEBHOOK_TIMEOUT_SECS);
        let max_payload_chars =
            parse_var(&get, "MAX_PAYLOAD_CHARS")?.unwrap_or(MAX_PAYLOAD_CHARS);

        let relay_path = get("RELAY_PATH")
            .map(|p| {
                if p.starts_with('/') {
                    p
                } else {
                    format!("/{}", p)
                }
            })
            .unwrap_or_else(|| DEFAULT_RELAY_PATH.to_string());

        let config = KtFormConfig {
            base: BaseConfig {
                server_port,
                cors_origins,
                environment,
            },
            webhook_url: get("WEBHOOK_URL"),
            relay_url: get("RELAY_URL"),
            relay_path,
            relay_max_body_bytes,
            webhook_timeout_seconds,
            max_payload_chars,
            storage_backend,
            s3_bucket: get("S3_BUCKET"),
            s3_region: get("S3_REGION"),
            s3_endpoint: get("S3_ENDPOINT"),
            aws_region: get("AWS_REGION"),
            aws_access_key_id: get("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
            local_storage_path: get("LOCAL_STORAGE_PATH"),
            local_storage_base_url: get("LOCAL_STORAGE_BASE_URL"),
            max_attachment_bytes,
            organization_name: get("KT_ORGANIZATION_NAME"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let environment = self.base.environment.to_lowercase();
        let is_production = environment == "production" || environment == "prod";
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        for (name, url) in [
            ("WEBHOOK_URL", self.webhook_url.as_deref()),
            ("RELAY_URL", self.relay_url.as_deref()),
        ] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
                }
            }
        }

        if self.max_attachment_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_ATTACHMENT_SIZE_MB must be greater than 0"));
        }

        if self.relay_max_body_bytes == 0 {
            return Err(anyhow::anyhow!("RELAY_MAX_BODY_MB must be greater than 0"));
        }

        if self.webhook_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("WEBHOOK_TIMEOUT_SECONDS must be greater than 0"));
        }

        if self.max_payload_chars == 0 {
            return Err(anyhow::anyhow!("MAX_PAYLOAD_CHARS must be greater than 0"));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            Some(StorageBackend::S3) => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
                if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
                    return Err(anyhow::anyhow!(
                        "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
                    ));
                }
            }
            Some(StorageBackend::Local) => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            None => {}
        }

        Ok(())
    }
}

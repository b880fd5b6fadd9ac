//! Configuration loading and validation for the vault server.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::SymmetricKey;

/// Validated server configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP(S) server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// HMAC secret used to sign bearer tokens. **Required.**
    pub token_sign_key: String,

    /// Lifetime of issued bearer tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Base64-encoded 32-byte key for field tokens. **Required.**
    pub field_key: String,

    /// Base64-encoded 32-byte key for file content. **Required.**
    pub blob_key: String,

    /// Reject field tokens older than this. Unset means no expiry.
    #[serde(default)]
    pub field_token_max_age_secs: Option<u64>,

    /// PostgreSQL connection string. Unset selects the in-memory backend.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Bucket for encrypted file content. Unset selects the in-memory store.
    #[serde(default)]
    pub s3_bucket: Option<String>,

    /// Custom S3 endpoint (MinIO and friends); enables path-style addressing.
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    /// PEM certificate chain. TLS is enabled when this and the key are set.
    #[serde(default)]
    pub tls_cert_path: Option<String>,

    #[serde(default)]
    pub tls_key_path: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body. File content travels base64-encoded
    /// inside JSON, so this bounds the largest storable file at about 3/4
    /// of the value.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// OTLP/gRPC collector endpoint. Unset disables span export.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_token_ttl() -> u64 {
    3600
}
fn default_database_max_connections() -> u32 {
    10
}
fn default_request_timeout() -> u64 {
    crate::server::middleware::REQUEST_TIMEOUT.as_secs()
}
fn default_max_body_bytes() -> usize {
    crate::server::middleware::MAX_BODY_BYTES
}
fn default_log_level() -> String {
    "info".into()
}

// Key material must not end up in logs via `{:?}`.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_port", &self.listen_port)
            .field("token_sign_key", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("field_key", &"[REDACTED]")
            .field("blob_key", &"[REDACTED]")
            .field("field_token_max_age_secs", &self.field_token_max_age_secs)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("database_max_connections", &self.database_max_connections)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("tls_cert_path", &self.tls_cert_path)
            .field("tls_key_path", &self.tls_key_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.token_sign_key, "TOKEN_SIGN_KEY")?;
        self.field_key().context("FIELD_KEY is invalid")?;
        self.blob_key().context("BLOB_KEY is invalid")?;

        if self.field_key.trim() == self.blob_key.trim() {
            anyhow::bail!("FIELD_KEY and BLOB_KEY must differ");
        }
        if self.token_ttl_secs == 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be > 0");
        }
        if self.field_token_max_age_secs == Some(0) {
            anyhow::bail!("FIELD_TOKEN_MAX_AGE_SECS must be > 0 when set");
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be > 0");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be > 0");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be > 0");
        }
        if self.tls_cert_path.is_some() != self.tls_key_path.is_some() {
            anyhow::bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together");
        }
        if self.s3_endpoint.is_some() && self.s3_bucket.is_none() {
            anyhow::bail!("S3_ENDPOINT requires S3_BUCKET");
        }
        Ok(())
    }

    pub fn field_key(&self) -> Result<SymmetricKey> {
        Ok(SymmetricKey::from_base64(&self.field_key)?)
    }

    pub fn blob_key(&self) -> Result<SymmetricKey> {
        Ok(SymmetricKey::from_base64(&self.blob_key)?)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn field_token_max_age(&self) -> Option<Duration> {
        self.field_token_max_age_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Certificate and key paths when TLS is enabled.
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

//! Configuration loading and validation for the gateway.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderName;
use serde::Deserialize;

use crate::content_type::{ContentTypeTable, DEFAULT_CONTENT_TYPES, DEFAULT_FALLBACK};
use crate::server::middleware::UNSEAL_TIMEOUT;

/// Validated gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory that sealed artifacts are resolved under. **Required.**
    pub base_dir: String,

    /// URL prefix stripped from request paths before resolving the resource.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// HTTP header carrying the caller's private key.
    #[serde(default = "default_key_header")]
    pub key_header_name: String,

    /// Port the gateway listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Seconds one unseal may take before the request fails.
    #[serde(default = "default_unseal_timeout_secs")]
    pub unseal_timeout_secs: u64,

    /// Comma-separated `ext=mime` table used for response content types.
    #[serde(default = "default_content_types")]
    pub content_types: String,

    /// Content type for extensions missing from `content_types`.
    #[serde(default = "default_fallback_content_type")]
    pub fallback_content_type: String,

    /// PEM certificate chain. Set together with `tls_key_path` to serve HTTPS.
    #[serde(default)]
    pub tls_cert_path: Option<String>,

    /// PEM private key for the TLS certificate.
    #[serde(default)]
    pub tls_key_path: Option<String>,

    /// OTLP endpoint for span export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_route_prefix() -> String {
    "/sealed".into()
}
fn default_key_header() -> String {
    "s5".into()
}
fn default_listen_port() -> u16 {
    8080
}
fn default_unseal_timeout_secs() -> u64 {
    UNSEAL_TIMEOUT.as_secs()
}
fn default_content_types() -> String {
    DEFAULT_CONTENT_TYPES.into()
}
fn default_fallback_content_type() -> String {
    DEFAULT_FALLBACK.into()
}
fn default_log_level() -> String {
    "info".into()
}

/// TLS file locations, present only when both halves are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: String,
    pub key: String,
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
        ensure_non_empty(&self.base_dir, "BASE_DIR")?;

        if !self.route_prefix.starts_with('/') || self.route_prefix.len() < 2 {
            anyhow::bail!("ROUTE_PREFIX must start with '/' and name at least one segment");
        }
        if self.route_prefix.ends_with('/') || self.route_prefix.contains(['*', ':']) {
            anyhow::bail!("ROUTE_PREFIX must not end with '/' or contain route wildcards");
        }
        if self.route_prefix == "/health" {
            anyhow::bail!("ROUTE_PREFIX must not shadow /health");
        }

        if self.unseal_timeout_secs == 0 {
            anyhow::bail!("UNSEAL_TIMEOUT_SECS must be at least 1");
        }

        HeaderName::from_bytes(self.key_header_name.as_bytes())
            .context("KEY_HEADER_NAME is not a valid HTTP header name")?;

        self.content_type_table()?;
        self.tls_paths()?;
        Ok(())
    }

    pub fn unseal_timeout(&self) -> Duration {
        Duration::from_secs(self.unseal_timeout_secs)
    }

    /// Build the content-type table from `content_types` and the fallback.
    pub fn content_type_table(&self) -> Result<ContentTypeTable> {
        ContentTypeTable::parse(&self.content_types, &self.fallback_content_type)
            .context("CONTENT_TYPES / FALLBACK_CONTENT_TYPE invalid")
    }

    /// TLS file paths, or `None` to serve plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if only one of the two paths is set.
    pub fn tls_paths(&self) -> Result<Option<TlsPaths>> {
        let cert = non_blank(&self.tls_cert_path);
        let key = non_blank(&self.tls_key_path);
        match (cert, key) {
            (Some(cert), Some(key)) => Ok(Some(TlsPaths {
                cert: cert.to_owned(),
                key: key.to_owned(),
            })),
            (None, None) => Ok(None),
            _ => anyhow::bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together"),
        }
    }

    /// OTLP endpoint, treating a blank value as unset.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        non_blank(&self.otel_exporter_otlp_endpoint)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

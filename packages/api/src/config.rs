use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use fairlist_compliance::ModelConfig;

use crate::error::{ApiError, Result};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BUCKET: &str = "fairlist-media-vault";
pub const DEFAULT_UPLOAD_PREFIX: &str = "uploads";

/// Server configuration, loaded once at start-up.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub region: String,
    pub bucket: String,
    pub upload_prefix: String,
    pub upload_url_ttl: Duration,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<HeaderValue>,
    pub rules_path: Option<PathBuf>,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its
    /// value. The model settings are read through the same lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".into())
            .parse()
            .map_err(|e| ApiError::Config(format!("invalid BIND_ADDR: {e}")))?;

        let region = lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.into());

        let bucket = lookup("MEDIA_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.into());

        let upload_prefix =
            lookup("UPLOAD_PREFIX").unwrap_or_else(|| DEFAULT_UPLOAD_PREFIX.into());

        let upload_url_ttl_secs: u64 = lookup("UPLOAD_URL_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(v) => parse_origins(&v)?,
            None => Vec::new(),
        };

        let rules_path = lookup("DISCLOSURE_RULES_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let model = ModelConfig::from_lookup(&lookup)?;

        if cors_allowed_origins.is_empty() {
            tracing::info!("CORS allows any origin");
        }

        Ok(Self {
            bind_addr,
            region,
            bucket,
            upload_prefix,
            upload_url_ttl: Duration::from_secs(upload_url_ttl_secs),
            cors_allowed_origins,
            rules_path,
            model,
        })
    }
}

/// Parse a comma-separated origin list. `*` alone means any origin.
pub fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| ApiError::Config(format!("invalid CORS origin '{o}': {e}")))
        })
        .collect()
}

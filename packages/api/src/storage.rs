//! Media bucket access: presigned uploads and the bucket CORS policy.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CorsConfiguration, CorsRule};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};

/// Capability to PUT one object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadTicket {
    pub upload_url: String,
    pub file_key: String,
}

#[async_trait]
pub trait UploadSigner: Send + Sync {
    async fn presign_upload(&self, filename: &str, content_type: &str) -> Result<UploadTicket>;
}

/// Reject names that are empty or would escape the upload prefix.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(ApiError::Validation("filename must not be empty".into()));
    }
    if filename.contains(['/', '\\']) || filename == ".." || filename == "." {
        return Err(ApiError::Validation(format!(
            "filename '{filename}' must not contain path separators"
        )));
    }
    if filename.chars().any(char::is_control) {
        return Err(ApiError::Validation(
            "filename must not contain control characters".into(),
        ));
    }
    Ok(())
}

/// `{prefix}/{unix_secs}_{filename}`
pub fn object_key(prefix: &str, unix_secs: i64, filename: &str) -> String {
    format!("{}/{unix_secs}_{filename}", prefix.trim_end_matches('/'))
}

pub struct S3UploadSigner {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
    ttl: Duration,
}

impl S3UploadSigner {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            ttl,
        }
    }
}

#[async_trait]
impl UploadSigner for S3UploadSigner {
    async fn presign_upload(&self, filename: &str, content_type: &str) -> Result<UploadTicket> {
        validate_filename(filename)?;
        if content_type.trim().is_empty() {
            return Err(ApiError::Validation("file_type must not be empty".into()));
        }

        let key = object_key(&self.prefix, chrono::Utc::now().timestamp(), filename);

        let presigning =
            PresigningConfig::expires_in(self.ttl).map_err(|e| ApiError::Storage(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| ApiError::Storage(DisplayErrorContext(e).to_string()))?;

        info!(bucket = %self.bucket, key = %key, ttl_secs = self.ttl.as_secs(), "issued upload URL");

        Ok(UploadTicket {
            upload_url: presigned.uri().to_string(),
            file_key: key,
        })
    }
}

/// CORS policy that lets browsers upload straight to the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_secs: i32,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_methods: ["PUT", "POST", "GET", "HEAD"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["*".into()],
            expose_headers: vec!["ETag".into()],
            max_age_secs: 3000,
        }
    }
}

impl CorsPolicy {
    pub fn to_configuration(&self) -> Result<CorsConfiguration> {
        let rule = CorsRule::builder()
            .set_allowed_origins(Some(self.allowed_origins.clone()))
            .set_allowed_methods(Some(self.allowed_methods.clone()))
            .set_allowed_headers(Some(self.allowed_headers.clone()))
            .set_expose_headers(Some(self.expose_headers.clone()))
            .max_age_seconds(self.max_age_secs)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        CorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))
    }
}

/// Replace the bucket's CORS configuration with `policy`.
pub async fn apply_bucket_cors(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    policy: &CorsPolicy,
) -> Result<()> {
    let configuration = policy.to_configuration()?;

    client
        .put_bucket_cors()
        .bucket(bucket)
        .cors_configuration(configuration)
        .send()
        .await
        .map_err(|e| ApiError::Storage(DisplayErrorContext(e).to_string()))?;

    info!(bucket, origins = ?policy.allowed_origins, "bucket CORS policy applied");
    Ok(())
}

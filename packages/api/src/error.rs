//! Maps collaborator failures to HTTP responses.
//!
//! Every error body has the shape `{"detail": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fairlist_compliance::ComplianceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Model(#[from] ComplianceError),

    #[error("object storage error: {0}")]
    Storage(String),

    #[error("speech service error: {0}")]
    Speech(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Model(_) | ApiError::Storage(_) | ApiError::Speech(_) | ApiError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("model API request failed: {0}")]
    ModelApiRequest(#[from] reqwest::Error),

    #[error("model API error (status {status}): {message}")]
    ModelApiError { status: u16, message: String },

    #[error("model service error ({provider}): {message}")]
    ModelService { provider: String, message: String },

    #[error("model request timed out after {secs}s")]
    ModelTimeout { secs: u64 },

    #[error("failed to parse model response: {0}")]
    ModelResponseParse(String),

    #[error("model returned empty response")]
    ModelEmptyResponse,

    #[error("invalid disclosure rules: {0}")]
    InvalidRules(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ComplianceError>;

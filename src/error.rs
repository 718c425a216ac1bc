use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlActivityError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("GitLab API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("GitLab API error (status {status}) persisted after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid notes filter: {0}")]
    InvalidFilter(String),

    #[error("Request limiter closed")]
    LimiterClosed,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GlActivityError>;

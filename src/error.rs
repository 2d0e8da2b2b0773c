//! Error types for bimehyar

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the answer-generation API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential validation error
    #[error("{0}")]
    Auth(String),

    /// Answer-generation error
    #[error("model error: {0}")]
    Llm(String),

    /// Durable storage error
    #[error("storage error: {0}")]
    Store(String),
}

impl Error {
    /// True for failures worth retrying on a different model: rate limits,
    /// server-side errors, and transport problems.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// True when the API reported a rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

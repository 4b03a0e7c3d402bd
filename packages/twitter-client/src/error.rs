//! Error types for the Twitter client.

use thiserror::Error;

/// Result type for Twitter client operations.
pub type Result<T> = std::result::Result<T, TwitterError>;

/// Twitter client errors.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Network error (connection failed, reset, body read failure)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API error (unexpected status). Carries the raw response body.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Parse error (response body not in the expected shape)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<std::convert::Infallible> for TwitterError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl TwitterError {
    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            TwitterError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

//! Error types for the extractor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for extraction runs
#[derive(Debug, Error)]
pub enum ExtractError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The request did not complete within its timeout
    #[error("Request to {url} timed out after {timeout_secs} seconds")]
    Timeout {
        /// URL being fetched
        url: String,
        /// Timeout that elapsed
        timeout_secs: u64,
    },

    /// The page could not be retrieved or decoded
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// URL being fetched
        url: String,
        /// Underlying transport message
        message: String,
    },

    /// Only http and https pages can be fetched
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

impl ExtractError {
    /// Whether another attempt at the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractError::Http(_) | ExtractError::Timeout { .. } | ExtractError::Fetch { .. }
        )
    }
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Http(e) => CrateError::Http(e),
            ExtractError::UrlParse(e) => CrateError::InvalidRequest(format!("Invalid URL: {e}")),
            _ => CrateError::Extract(err.to_string()),
        }
    }
}

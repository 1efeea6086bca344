//! Error types for the sitesift crate

use thiserror::Error;

/// Result type for sitesift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sitesift operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Extraction run error
    #[error("Extraction error: {0}")]
    Extract(String),

    /// Export error
    #[error("Export error: {0}")]
    Export(String),

    /// Sink authentication error
    #[error("Authentication error: {0}")]
    Auth(String),
}

//! Error types for the export module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for tabular sink operations
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote sink rejected the request
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The sheet URL does not identify a spreadsheet
    #[error("Invalid sheet URL: {0}")]
    InvalidSheetUrl(String),
}

impl From<ExportError> for CrateError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => CrateError::Io(e),
            ExportError::Http(e) => CrateError::Http(e),
            ExportError::Auth(msg) => CrateError::Auth(msg),
            _ => CrateError::Export(err.to_string()),
        }
    }
}

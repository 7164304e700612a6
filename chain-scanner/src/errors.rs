//! Error types for the chain-scanner library.

use thiserror::Error;

/// Top-level error type for the scanner library.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// Rejected scanner configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Transport failure talking to the upstream feed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status code.
    #[error("Upstream returned HTTP {status}: {url}")]
    Status { status: u16, url: String },

    /// Upstream body could not be decoded.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// A request did not complete within its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A user-supplied date could not be parsed.
    #[error("Invalid date '{0}', expected DD-MM-YYYY")]
    InvalidDate(String),

    /// Index with no known listing exchange.
    #[error("Unsupported index: {0}")]
    UnsupportedIndex(String),

    /// The scan task itself failed (panicked or was cancelled).
    #[error("Scan task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for ScannerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Convenience Result type for this library.
pub type Result<T> = std::result::Result<T, ScannerError>;

//! Error types for the relay module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while relaying a file.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No credential was supplied by config or environment.
    #[error("relay configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The credential could not be parsed.
    #[error("invalid relay credential: {0}")]
    InvalidCredential(String),

    /// The local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure talking to the service.
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("relay rejected upload (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service answered 2xx but the body was not understood.
    #[error("malformed relay response: {0}")]
    MalformedResponse(String),
}

impl RelayError {
    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "ConfigurationMissing",
            Self::InvalidCredential(_) => "InvalidCredential",
            Self::Io { .. } => "Io",
            Self::Http(_) => "Http",
            Self::Rejected { .. } => "Rejected",
            Self::MalformedResponse(_) => "MalformedResponse",
        }
    }
}

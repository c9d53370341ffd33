//! Error types for the retrieval module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching media.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The tool process could not be started.
    #[error("failed to launch {program}: {source}")]
    ProcessLaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported failure.
    #[error("{program} failed with {status}")]
    ProcessNonZeroExit {
        program: PathBuf,
        status: String,
        stdout: String,
        stderr: String,
    },

    /// Every attempt of the multi-attempt path failed.
    #[error("retrieval exhausted after {attempts} attempts (last failure: {})", .last_cause.kind())]
    RetrievalExhausted {
        attempts: u32,
        #[source]
        last_cause: Box<RetrievalError>,
    },
}

impl RetrievalError {
    /// Creates a non-zero exit error from captured output.
    pub fn non_zero_exit(
        program: impl Into<PathBuf>,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        let status = match exit_code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        };
        Self::ProcessNonZeroExit {
            program: program.into(),
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProcessLaunchFailed { .. } => "ProcessLaunchFailed",
            Self::ProcessNonZeroExit { .. } => "ProcessNonZeroExit",
            Self::RetrievalExhausted { .. } => "RetrievalExhausted",
        }
    }
}

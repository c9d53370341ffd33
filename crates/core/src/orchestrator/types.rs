//! Types for the download orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::platform::{resolve_platform, Platform, PlatformError};
use crate::relay::{RelayError, RelayedAsset};
use crate::retrieval::RetrievalError;

/// Message returned with every completed batch.
pub const COMPLETION_MESSAGE: &str = "Download process completed";

/// One requested media location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    pub url: String,
    /// Platform label; derived from the URL when absent.
    #[serde(default)]
    pub platform: Option<String>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            platform: None,
        }
    }

    pub fn with_platform(url: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            platform: Some(platform.into()),
        }
    }

    /// Determines the task's platform.
    ///
    /// An explicit label wins and is not cross-checked against the URL. A
    /// label outside the known set is trusted as [`Platform::Other`].
    pub fn resolve_platform(&self) -> Result<Platform, PlatformError> {
        if self.url.trim().is_empty() {
            return Err(PlatformError::InvalidUrl {
                url: self.url.clone(),
                reason: "empty URL".to_string(),
            });
        }

        match self.platform.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => Ok(label.parse().unwrap_or(Platform::Other)),
            _ => resolve_platform(&self.url),
        }
    }
}

/// An ordered batch of tasks plus an optional destination directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub tasks: Vec<DownloadTask>,
    #[serde(default)]
    pub folder: Option<String>,
}

/// Task-local failure. Never aborts sibling tasks.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{}: {}", .0.kind(), .0)]
    Platform(#[from] PlatformError),

    #[error("{}: {}", .0.kind(), .0)]
    Retrieval(#[from] RetrievalError),

    /// Retrieval succeeded but the relay did not accept the file.
    #[error("RelayFailed: {0}")]
    RelayFailed(#[source] RelayError),

    /// The runner ended without producing its own record.
    #[error("Aborted: {0}")]
    Aborted(String),
}

impl TaskError {
    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Platform(e) => e.kind(),
            Self::Retrieval(e) => e.kind(),
            Self::RelayFailed(_) => "RelayFailed",
            Self::Aborted(_) => "Aborted",
        }
    }
}

/// Final state of one task, returned by value from its runner.
#[derive(Debug)]
pub struct TaskOutcome {
    /// Position of the task in its batch.
    pub index: usize,
    pub url: String,
    pub platform: Option<Platform>,
    /// Retrieval attempts made.
    pub attempts: u32,
    pub result: Result<RelayedAsset, TaskError>,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The reported string: a reference location or a failure description.
    pub fn record(&self) -> String {
        match &self.result {
            Ok(asset) => asset.reference.clone(),
            Err(e) => format!("Failed to download {}: {}", self.url, e),
        }
    }
}

/// Aggregated, positional batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub message: String,
    pub results: Vec<String>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        Self {
            message: COMPLETION_MESSAGE.to_string(),
            results: outcomes.iter().map(TaskOutcome::record).collect(),
        }
    }
}

/// Batch-fatal errors. No task runs when one of these is returned.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The destination directory could not be created.
    #[error("Failed to create folder {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Configured concurrency limit.
    pub max_concurrent_tasks: usize,
    /// Slots currently held by running tasks.
    pub active_slots: usize,
    /// Batches currently being processed.
    pub batches_in_flight: usize,
    /// Tasks relayed since startup.
    pub tasks_succeeded: u64,
    /// Tasks failed since startup.
    pub tasks_failed: u64,
    /// Entries in the proxy pool.
    pub proxy_count: usize,
}

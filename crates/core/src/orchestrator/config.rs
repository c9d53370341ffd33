//! Orchestrator configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the download orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum tasks holding a retrieval-and-relay slot at once.
    /// Shared by all batches in the process.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,

    /// Lower bound of the pause between task launches (milliseconds).
    #[serde(default = "default_pacing_min")]
    pub pacing_min_ms: u64,

    /// Upper bound (exclusive) of the pause between task launches.
    #[serde(default = "default_pacing_max")]
    pub pacing_max_ms: u64,

    /// Destination used when a batch names none.
    /// Defaults to the process working directory.
    #[serde(default)]
    pub default_folder: Option<PathBuf>,

    /// Render per-task progress bars on the terminal.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_pacing_min() -> u64 {
    2000
}

fn default_pacing_max() -> u64 {
    5000
}

fn default_show_progress() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent(),
            pacing_min_ms: default_pacing_min(),
            pacing_max_ms: default_pacing_max(),
            default_folder: None,
            show_progress: default_show_progress(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_concurrency(mut self, max_concurrent_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_concurrent_tasks;
        self
    }

    pub fn with_pacing(mut self, min: Duration, max: Duration) -> Self {
        self.pacing_min_ms = min.as_millis() as u64;
        self.pacing_max_ms = max.as_millis() as u64;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Draws one launch pause from `[pacing_min_ms, pacing_max_ms)`.
    pub fn pacing_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let millis = if self.pacing_max_ms > self.pacing_min_ms {
            rng.gen_range(self.pacing_min_ms..self.pacing_max_ms)
        } else {
            self.pacing_min_ms
        };
        Duration::from_millis(millis)
    }
}

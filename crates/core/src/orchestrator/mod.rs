//! Download orchestrator.
//!
//! Takes an ordered batch of tasks and drives each one through platform
//! resolution, retrieval, relay and cleanup:
//! - **Launch**: sequential, with a randomized pause between launches
//! - **Execution**: concurrent, bounded by a shared slot limiter
//! - **Results**: collected in input order, one record per task

mod config;
mod runner;
mod task;
mod types;

pub use config::OrchestratorConfig;
pub use runner::Orchestrator;
pub use types::{
    BatchReport, BatchRequest, DownloadTask, OrchestratorError, OrchestratorStatus, TaskError,
    TaskOutcome, COMPLETION_MESSAGE,
};

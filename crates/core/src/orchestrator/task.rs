//! Per-task pipeline: resolve, fetch, relay, clean up.

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::metrics::{CLEANUP_FAILURES, TASKS_TOTAL, TASK_DURATION};
use crate::platform::Platform;
use crate::relay::{Relay, RelayedAsset};
use crate::retrieval::{RetrievalDriver, RetrievalError};

use super::types::{DownloadTask, TaskError, TaskOutcome};

/// Drives one task to exactly one outcome.
pub(crate) struct TaskRunner {
    pub index: usize,
    pub task: DownloadTask,
    pub dir: PathBuf,
    pub slots: Arc<Semaphore>,
    pub driver: Arc<RetrievalDriver>,
    pub relay: Arc<dyn Relay>,
    pub progress: ProgressBar,
}

impl TaskRunner {
    pub async fn run(self) -> TaskOutcome {
        let start = Instant::now();

        let platform = match self.task.resolve_platform() {
            Ok(platform) => platform,
            Err(e) => {
                warn!("Task {} ({}) rejected: {}", self.index + 1, self.task.url, e);
                return self.finish(None, 0, Err(e.into()), start);
            }
        };
        self.progress
            .set_prefix(format!("[{}] {}", self.index + 1, platform));

        let permit = match Arc::clone(&self.slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                let err = TaskError::Aborted("concurrency limiter closed".to_string());
                return self.finish(Some(platform), 0, Err(err), start);
            }
        };
        debug!("Task {} acquired a slot", self.index + 1);

        let (attempts, result) = self.fetch_and_relay(platform).await;
        drop(permit);

        self.finish(Some(platform), attempts, result, start)
    }

    async fn fetch_and_relay(&self, platform: Platform) -> (u32, Result<RelayedAsset, TaskError>) {
        let dest = RetrievalDriver::temp_path(&self.dir);

        let retrieved = self
            .driver
            .retrieve_to(&self.task.url, platform, &dest, &self.progress)
            .await;

        let outcome = match retrieved {
            Ok(file) => {
                let relayed = self
                    .relay
                    .relay(&file.path)
                    .await
                    .map_err(TaskError::RelayFailed);
                (file.attempts, relayed)
            }
            Err(e) => {
                let attempts = match &e {
                    RetrievalError::RetrievalExhausted { attempts, .. } => *attempts,
                    _ => 1,
                };
                (attempts, Err(e.into()))
            }
        };

        remove_temp_files(&dest).await;
        outcome
    }

    fn finish(
        &self,
        platform: Option<Platform>,
        attempts: u32,
        result: Result<RelayedAsset, TaskError>,
        start: Instant,
    ) -> TaskOutcome {
        let label = if result.is_ok() { "relayed" } else { "failed" };
        TASKS_TOTAL.with_label_values(&[label]).inc();
        TASK_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(asset) => info!(
                "Task {} done: {} -> {}",
                self.index + 1,
                self.task.url,
                asset.reference
            ),
            Err(e) => info!("Task {} failed: {} ({})", self.index + 1, self.task.url, e.kind()),
        }

        if let Some(len) = self.progress.length() {
            self.progress.set_position(len);
        }
        self.progress.finish_with_message(label);

        TaskOutcome {
            index: self.index,
            url: self.task.url.clone(),
            platform,
            attempts,
            result,
        }
    }
}

/// Removes a task's temporary file and every partial file the retrieval
/// tool left beside it (`.part`, `.ytdl`, `.part-Frag*`).
///
/// Temporary names are unique per task, so anything in the directory whose
/// name starts with the temporary name belongs to this task.
pub(crate) async fn remove_temp_files(dest: &Path) {
    let (Some(dir), Some(name)) = (dest.parent(), dest.file_name()) else {
        remove_temp_file(dest).await;
        return;
    };
    let name = name.to_string_lossy();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {} for cleanup: {}", dir.display(), e);
            remove_temp_file(dest).await;
            return;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                if entry.file_name().to_string_lossy().starts_with(name.as_ref()) {
                    remove_temp_file(&entry.path()).await;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to list {} for cleanup: {}", dir.display(), e);
                remove_temp_file(dest).await;
                break;
            }
        }
    }
}

/// Removes one file. Failures are logged, never surfaced.
pub(crate) async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            CLEANUP_FAILURES.inc();
            warn!("Failed to remove local file {}: {}", path.display(), e);
        }
    }
}

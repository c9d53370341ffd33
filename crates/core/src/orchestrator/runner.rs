//! Batch orchestrator: paced fan-out, bounded execution, positional fan-in.

use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::metrics::{BATCHES_TOTAL, TASKS_TOTAL};
use crate::relay::Relay;
use crate::retrieval::RetrievalDriver;

use super::config::OrchestratorConfig;
use super::task::TaskRunner;
use super::types::{
    BatchReport, BatchRequest, DownloadTask, OrchestratorError, OrchestratorStatus, TaskError,
    TaskOutcome,
};

#[derive(Debug, Default)]
struct Counters {
    batches_in_flight: AtomicUsize,
    tasks_succeeded: AtomicU64,
    tasks_failed: AtomicU64,
}

/// Decrements the in-flight batch count when a batch ends, however it ends.
struct InFlight(Arc<Counters>);

impl InFlight {
    fn enter(counters: Arc<Counters>) -> Self {
        counters.batches_in_flight.fetch_add(1, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.batches_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs batches of download tasks.
///
/// The concurrency limiter is shared by every batch this orchestrator runs,
/// so concurrent batches together never exceed `max_concurrent_tasks`.
pub struct Orchestrator {
    config: OrchestratorConfig,
    driver: Arc<RetrievalDriver>,
    relay: Arc<dyn Relay>,
    slots: Arc<Semaphore>,
    counters: Arc<Counters>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, driver: RetrievalDriver, relay: Arc<dyn Relay>) -> Self {
        let limit = config.max_concurrent_tasks.max(1);
        Self {
            config,
            driver: Arc::new(driver),
            relay,
            slots: Arc::new(Semaphore::new(limit)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs every task of `request` and returns one record per task, in order.
    ///
    /// Individual task failures are reported in the records. Only an unusable
    /// destination directory fails the batch as a whole.
    pub async fn run_batch(&self, request: BatchRequest) -> Result<BatchReport, OrchestratorError> {
        let outcomes = self.run_batch_outcomes(request).await?;
        Ok(BatchReport::from_outcomes(&outcomes))
    }

    /// Like [`run_batch`](Self::run_batch) but returns the full outcomes.
    ///
    /// Once the folder is ready the batch runs on its own task: dropping the
    /// returned future stops waiting for the report, not the batch.
    pub async fn run_batch_outcomes(
        &self,
        request: BatchRequest,
    ) -> Result<Vec<TaskOutcome>, OrchestratorError> {
        let dir = self.prepare_folder(request.folder.as_deref()).await?;
        let urls: Vec<String> = request.tasks.iter().map(|t| t.url.clone()).collect();

        let batch = Batch {
            config: self.config.clone(),
            driver: Arc::clone(&self.driver),
            relay: Arc::clone(&self.relay),
            slots: Arc::clone(&self.slots),
            counters: Arc::clone(&self.counters),
        };

        match tokio::spawn(batch.run(request.tasks, dir)).await {
            Ok(outcomes) => Ok(outcomes),
            Err(e) => {
                error!("Batch ended abnormally: {}", e);
                Ok(urls
                    .into_iter()
                    .enumerate()
                    .map(|(index, url)| aborted(index, url, e.to_string()))
                    .collect())
            }
        }
    }

    /// Current limiter and throughput counters.
    pub fn status(&self) -> OrchestratorStatus {
        let limit = self.config.max_concurrent_tasks.max(1);
        OrchestratorStatus {
            max_concurrent_tasks: limit,
            active_slots: self.active_slots(),
            batches_in_flight: self.batches_in_flight(),
            tasks_succeeded: self.counters.tasks_succeeded.load(Ordering::Relaxed),
            tasks_failed: self.counters.tasks_failed.load(Ordering::Relaxed),
            proxy_count: self.driver.proxies().len(),
        }
    }

    pub fn active_slots(&self) -> usize {
        let limit = self.config.max_concurrent_tasks.max(1);
        limit.saturating_sub(self.slots.available_permits())
    }

    pub fn batches_in_flight(&self) -> usize {
        self.counters.batches_in_flight.load(Ordering::SeqCst)
    }

    async fn prepare_folder(&self, requested: Option<&str>) -> Result<PathBuf, OrchestratorError> {
        let dir = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(folder) => PathBuf::from(folder),
            None => match &self.config.default_folder {
                Some(folder) => folder.clone(),
                None => std::env::current_dir().map_err(|e| {
                    OrchestratorError::DirectoryUnavailable {
                        path: PathBuf::from("."),
                        source: e,
                    }
                })?,
            },
        };

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| OrchestratorError::DirectoryUnavailable {
                path: dir.clone(),
                source: e,
            })?;

        Ok(dir)
    }
}

/// One batch's share of the orchestrator, owned by the batch's own task.
struct Batch {
    config: OrchestratorConfig,
    driver: Arc<RetrievalDriver>,
    relay: Arc<dyn Relay>,
    slots: Arc<Semaphore>,
    counters: Arc<Counters>,
}

impl Batch {
    /// Paces and launches every task, then collects outcomes in input order.
    async fn run(self, tasks: Vec<DownloadTask>, dir: PathBuf) -> Vec<TaskOutcome> {
        let _in_flight = InFlight::enter(Arc::clone(&self.counters));
        BATCHES_TOTAL.inc();

        let total = tasks.len();
        info!("Starting batch of {} tasks into {}", total, dir.display());

        let progress = self.multi_progress();
        let mut rng = StdRng::from_entropy();
        let mut handles = Vec::with_capacity(total);

        for (index, task) in tasks.into_iter().enumerate() {
            if index > 0 {
                let delay = self.config.pacing_delay(&mut rng);
                debug!("Pacing {:?} before launching task {}", delay, index + 1);
                tokio::time::sleep(delay).await;
            }

            let url = task.url.clone();
            let runner = TaskRunner {
                index,
                task,
                dir: dir.clone(),
                slots: Arc::clone(&self.slots),
                driver: Arc::clone(&self.driver),
                relay: Arc::clone(&self.relay),
                progress: self.task_bar(&progress, index),
            };
            handles.push((index, url, tokio::spawn(runner.run())));
        }

        let outcomes = join_all(handles.into_iter().map(|(index, url, handle)| async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Task {} ({}) ended abnormally: {}", index + 1, url, e);
                    TASKS_TOTAL.with_label_values(&["failed"]).inc();
                    aborted(index, url, e.to_string())
                }
            }
        }))
        .await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        self.counters
            .tasks_succeeded
            .fetch_add(succeeded as u64, Ordering::Relaxed);
        self.counters
            .tasks_failed
            .fetch_add(failed as u64, Ordering::Relaxed);

        info!(
            "Batch finished: {} succeeded, {} failed of {}",
            succeeded, failed, total
        );

        outcomes
    }

    fn multi_progress(&self) -> MultiProgress {
        if self.config.show_progress {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        }
    }

    fn task_bar(&self, progress: &MultiProgress, index: usize) -> ProgressBar {
        let bar = progress.add(ProgressBar::new(
            self.driver.config().progress_steps.max(1),
        ));
        if let Ok(style) =
            ProgressStyle::default_bar().template("{prefix:<14} {percent:>3}% [{bar:40}] {msg}")
        {
            bar.set_style(style.progress_chars("█░ "));
        }
        bar.set_prefix(format!("[{}]", index + 1));
        bar
    }
}

fn aborted(index: usize, url: String, reason: String) -> TaskOutcome {
    TaskOutcome {
        index,
        url,
        platform: None,
        attempts: 0,
        result: Err(TaskError::Aborted(reason)),
    }
}

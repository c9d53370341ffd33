//! Mock tool runner for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::retrieval::{RetrievalError, ToolInvocation, ToolOutput, ToolRunner};

/// Mock implementation of the ToolRunner trait.
///
/// Provides controllable behavior for testing:
/// - Scripted outcomes, consumed in call order
/// - Per-URL outcomes for deterministic results under concurrency
/// - Recorded invocations for assertions
/// - Peak concurrency tracking
///
/// A successful run writes a small file at the invocation's `-o` path, so
/// downstream relay and cleanup see a real file.
///
/// # Example
///
/// ```rust,ignore
/// use mediarelay_core::testing::MockToolRunner;
///
/// let runner = MockToolRunner::new();
/// runner.push_outcomes([Ok(ToolOutput::failure(1, "403"))]).await;
///
/// // Use in a RetrievalDriver...
///
/// assert_eq!(runner.invocation_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockToolRunner {
    /// Outcomes consumed one per call before anything else applies.
    queued: Arc<RwLock<VecDeque<Result<ToolOutput, RetrievalError>>>>,
    /// Outcomes keyed by the source URL (the last argument).
    by_url: Arc<RwLock<HashMap<String, ToolOutput>>>,
    /// Outcome when nothing more specific applies.
    default_outcome: Arc<RwLock<ToolOutput>>,
    /// Recorded invocations.
    invocations: Arc<RwLock<Vec<ToolInvocation>>>,
    /// Simulated run time per call.
    run_duration: Arc<RwLock<Duration>>,
    /// When set, a failed call leaves `<output>.part` behind like yt-dlp does.
    partial_on_failure: Arc<RwLock<bool>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockToolRunner {
    /// Create a mock runner whose calls succeed by default.
    pub fn new() -> Self {
        Self {
            queued: Arc::new(RwLock::new(VecDeque::new())),
            by_url: Arc::new(RwLock::new(HashMap::new())),
            default_outcome: Arc::new(RwLock::new(ToolOutput::success())),
            invocations: Arc::new(RwLock::new(Vec::new())),
            run_duration: Arc::new(RwLock::new(Duration::ZERO)),
            partial_on_failure: Arc::new(RwLock::new(false)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// A launch failure, as if the binary were missing.
    pub fn launch_error() -> RetrievalError {
        RetrievalError::ProcessLaunchFailed {
            program: PathBuf::from("yt-dlp"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock: not found"),
        }
    }

    /// Queue outcomes for the next calls.
    pub async fn push_outcomes(
        &self,
        outcomes: impl IntoIterator<Item = Result<ToolOutput, RetrievalError>>,
    ) {
        self.queued.write().await.extend(outcomes);
    }

    /// Set the outcome for every call fetching `url`.
    pub async fn set_outcome_for_url(&self, url: impl Into<String>, output: ToolOutput) {
        self.by_url.write().await.insert(url.into(), output);
    }

    /// Set the outcome used when no queued or per-URL outcome applies.
    pub async fn set_default_outcome(&self, output: ToolOutput) {
        *self.default_outcome.write().await = output;
    }

    /// Set how long each call takes.
    pub async fn set_run_duration(&self, duration: Duration) {
        *self.run_duration.write().await = duration;
    }

    /// Leave a `.part` file next to the output on failed calls.
    pub async fn set_partial_on_failure(&self, enabled: bool) {
        *self.partial_on_failure.write().await = enabled;
    }

    /// Get all recorded invocations.
    pub async fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.read().await.clone()
    }

    /// Get recorded invocations for one source URL.
    pub async fn invocations_for(&self, url: &str) -> Vec<ToolInvocation> {
        self.invocations
            .read()
            .await
            .iter()
            .filter(|inv| inv.args.last().map(String::as_str) == Some(url))
            .cloned()
            .collect()
    }

    /// Get the number of calls made.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Highest number of calls observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn next_outcome(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RetrievalError> {
        if let Some(outcome) = self.queued.write().await.pop_front() {
            return outcome;
        }
        if let Some(url) = invocation.args.last() {
            if let Some(output) = self.by_url.read().await.get(url) {
                return Ok(output.clone());
            }
        }
        Ok(self.default_outcome.read().await.clone())
    }
}

fn output_path(invocation: &ToolInvocation) -> Option<PathBuf> {
    invocation
        .args
        .iter()
        .position(|a| a == "-o")
        .and_then(|i| invocation.args.get(i + 1))
        .map(PathBuf::from)
}

#[async_trait]
impl ToolRunner for MockToolRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RetrievalError> {
        self.invocations.write().await.push(invocation.clone());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let duration = *self.run_duration.read().await;
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }

        let outcome = self.next_outcome(invocation).await;
        let partial_on_failure = *self.partial_on_failure.read().await;
        if let Some(path) = output_path(invocation) {
            match &outcome {
                Ok(output) if output.succeeded() => {
                    let _ = tokio::fs::write(&path, b"mock media").await;
                }
                _ if partial_on_failure => {
                    let mut partial = path.into_os_string();
                    partial.push(".part");
                    let _ = tokio::fs::write(&partial, b"mock partial").await;
                }
                _ => {}
            }
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

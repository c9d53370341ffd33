//! Attempt policy for fetching one task's media.

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics::{ATTEMPTS_TOTAL, RETRIEVALS_EXHAUSTED};
use crate::platform::Platform;
use crate::proxy::ProxyPool;

use super::config::RetrievalConfig;
use super::error::RetrievalError;
use super::traits::ToolRunner;
use super::types::{AttemptFailure, AttemptRoute, RetrievedFile, ToolInvocation, ToolOutput};

/// Drives the external tool for one task at a time.
///
/// Cheap to share: the proxy pool and runner are behind `Arc`.
pub struct RetrievalDriver {
    config: RetrievalConfig,
    proxies: Arc<ProxyPool>,
    runner: Arc<dyn ToolRunner>,
}

impl RetrievalDriver {
    pub fn new(
        config: RetrievalConfig,
        proxies: Arc<ProxyPool>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            config,
            proxies,
            runner,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }

    /// Generates a unique temporary file path inside `dir`.
    pub fn temp_path(dir: &Path) -> PathBuf {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();
        let suffix = Uuid::new_v4().simple().to_string();
        dir.join(format!("tempfile_{}_{}.mp4", nanos, &suffix[..8]))
    }

    /// Fetches `url` into a fresh temporary file inside `dir`.
    ///
    /// On failure the temporary path may still hold a partial file; removing
    /// it is the caller's job.
    pub async fn retrieve(
        &self,
        url: &str,
        platform: Platform,
        dir: &Path,
        progress: &ProgressBar,
    ) -> Result<RetrievedFile, RetrievalError> {
        let dest = Self::temp_path(dir);
        self.retrieve_to(url, platform, &dest, progress).await
    }

    /// Fetches `url` into `dest`.
    pub async fn retrieve_to(
        &self,
        url: &str,
        platform: Platform,
        dest: &Path,
        progress: &ProgressBar,
    ) -> Result<RetrievedFile, RetrievalError> {
        if platform.uses_retrieval_tool() {
            self.retrieve_with_fallback(url, dest, progress).await
        } else {
            self.retrieve_direct(url, dest, progress).await
        }
    }

    /// Single direct fetch, no proxy and no retry.
    async fn retrieve_direct(
        &self,
        url: &str,
        dest: &Path,
        progress: &ProgressBar,
    ) -> Result<RetrievedFile, RetrievalError> {
        let invocation = self.build_invocation(AttemptRoute::DirectFetch, 1, dest, url);

        match self.execute(&invocation, progress).await {
            Ok(()) => Ok(self.retrieved(dest, 1, Vec::new()).await),
            Err(e) => {
                warn!("Direct fetch of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    /// Proxied attempts followed by one direct fallback.
    async fn retrieve_with_fallback(
        &self,
        url: &str,
        dest: &Path,
        progress: &ProgressBar,
    ) -> Result<RetrievedFile, RetrievalError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut failures = Vec::new();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let route = if attempt < max_attempts {
                AttemptRoute::Proxied(self.proxies.choose().clone())
            } else {
                info!("Attempt {} for {}: falling back to no proxy", attempt, url);
                AttemptRoute::Direct
            };

            let invocation = self.build_invocation(route, attempt, dest, url);
            debug!(
                "Attempt {}/{} for {} via {}",
                attempt, max_attempts, url, invocation.route
            );

            match self.execute(&invocation, progress).await {
                Ok(()) => return Ok(self.retrieved(dest, attempt, failures).await),
                Err(e) => {
                    log_attempt_failure(url, &invocation, &e);
                    failures.push(AttemptFailure {
                        attempt,
                        route: invocation.route.label().to_string(),
                        proxy: invocation.route.proxy().map(|p| p.address.clone()),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                    last_error = Some(e);

                    if attempt < max_attempts && self.config.retry_delay_ms > 0 {
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }

        RETRIEVALS_EXHAUSTED.inc();
        Err(RetrievalError::RetrievalExhausted {
            attempts: max_attempts,
            last_cause: Box::new(
                last_error.unwrap_or_else(|| RetrievalError::non_zero_exit("", None, "", "")),
            ),
        })
    }

    /// Builds the command line for one attempt.
    pub fn build_invocation(
        &self,
        route: AttemptRoute,
        attempt: u32,
        dest: &Path,
        url: &str,
    ) -> ToolInvocation {
        let dest = dest.to_string_lossy().to_string();

        let (program, args) = match &route {
            AttemptRoute::DirectFetch => (
                self.config.curl_path.clone(),
                vec!["-L".to_string(), "-o".to_string(), dest, url.to_string()],
            ),
            AttemptRoute::Proxied(_) | AttemptRoute::Direct => {
                let mut args = Vec::new();
                if let Some(proxy) = route.proxy() {
                    args.extend(["--proxy".to_string(), proxy.address.clone()]);
                }
                args.extend([
                    "--socket-timeout".to_string(),
                    self.config.socket_timeout_secs.to_string(),
                    "--retries".to_string(),
                    self.config.tool_retries.to_string(),
                    "-o".to_string(),
                    dest,
                    url.to_string(),
                ]);
                (self.config.ytdlp_path.clone(), args)
            }
        };

        ToolInvocation {
            program,
            args,
            route,
            attempt,
        }
    }

    /// Runs one attempt while advancing the progress bar.
    async fn execute(
        &self,
        invocation: &ToolInvocation,
        progress: &ProgressBar,
    ) -> Result<(), RetrievalError> {
        progress.set_position(0);

        let attempt = self.runner.run(invocation);
        tokio::pin!(attempt);
        let ticker = tick_progress(
            progress,
            self.config.progress_steps,
            self.config.progress_tick(),
        );

        // The ticker lives inside this future and is dropped with it.
        let result = tokio::select! {
            output = &mut attempt => output,
            () = ticker => attempt.await,
        };

        let outcome = result.and_then(|output| check_exit(invocation, output));
        let label = if outcome.is_ok() { "success" } else { "failed" };
        ATTEMPTS_TOTAL
            .with_label_values(&[invocation.route.label(), label])
            .inc();

        outcome
    }

    async fn retrieved(
        &self,
        dest: &Path,
        attempts: u32,
        failures: Vec<AttemptFailure>,
    ) -> RetrievedFile {
        let size_bytes = tokio::fs::metadata(dest).await.ok().map(|m| m.len());
        RetrievedFile {
            path: dest.to_path_buf(),
            attempts,
            failures,
            size_bytes,
        }
    }
}

fn check_exit(invocation: &ToolInvocation, output: ToolOutput) -> Result<(), RetrievalError> {
    if output.succeeded() {
        Ok(())
    } else {
        Err(RetrievalError::non_zero_exit(
            invocation.program.clone(),
            output.exit_code,
            output.stdout,
            output.stderr,
        ))
    }
}

fn log_attempt_failure(url: &str, invocation: &ToolInvocation, error: &RetrievalError) {
    let proxy = invocation
        .route
        .proxy()
        .map(|p| p.address.as_str())
        .unwrap_or("none");

    match error {
        RetrievalError::ProcessNonZeroExit { stdout, stderr, .. } => warn!(
            "Attempt {} failed for {} with proxy {}: {}\nStdout: {}\nStderr: {}",
            invocation.attempt, url, proxy, error, stdout, stderr
        ),
        _ => warn!(
            "Attempt {} failed for {} with proxy {}: {}",
            invocation.attempt, url, proxy, error
        ),
    }
}

/// Advances `progress` one unit per tick, independent of the transfer itself.
async fn tick_progress(progress: &ProgressBar, steps: u64, tick: Duration) {
    for _ in 0..steps {
        tokio::time::sleep(tick).await;
        progress.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ProxyEntry, DEFAULT_ALLOWED_PORTS};
    use crate::testing::MockToolRunner;
    use tempfile::TempDir;

    fn pool() -> Arc<ProxyPool> {
        Arc::new(
            ProxyPool::from_entries(vec![
                ProxyEntry::parse("1.1.1.1:8080", DEFAULT_ALLOWED_PORTS).unwrap(),
                ProxyEntry::parse("2.2.2.2:3128", DEFAULT_ALLOWED_PORTS).unwrap(),
            ])
            .unwrap(),
        )
    }

    fn fast_config() -> RetrievalConfig {
        RetrievalConfig::default()
            .with_retry_delay(Duration::ZERO)
            .with_progress(5, Duration::from_millis(1))
    }

    fn driver(runner: Arc<MockToolRunner>) -> RetrievalDriver {
        RetrievalDriver::new(fast_config(), pool(), runner)
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let dir = Path::new("/tmp/media");
        let a = RetrievalDriver::temp_path(dir);
        let b = RetrievalDriver::temp_path(dir);
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir));
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tempfile_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_build_proxied_invocation() {
        let driver = driver(Arc::new(MockToolRunner::new()));
        let proxy = ProxyEntry::parse("1.1.1.1:8080", DEFAULT_ALLOWED_PORTS).unwrap();
        let inv = driver.build_invocation(
            AttemptRoute::Proxied(proxy),
            1,
            Path::new("/tmp/out.mp4"),
            "https://youtu.be/abc",
        );

        assert_eq!(inv.program, PathBuf::from("yt-dlp"));
        assert_eq!(
            inv.args,
            vec![
                "--proxy",
                "http://1.1.1.1:8080",
                "--socket-timeout",
                "10",
                "--retries",
                "5",
                "-o",
                "/tmp/out.mp4",
                "https://youtu.be/abc",
            ]
        );
    }

    #[test]
    fn test_build_direct_invocation_has_no_proxy() {
        let driver = driver(Arc::new(MockToolRunner::new()));
        let inv = driver.build_invocation(
            AttemptRoute::Direct,
            4,
            Path::new("/tmp/out.mp4"),
            "https://youtu.be/abc",
        );

        assert_eq!(inv.program, PathBuf::from("yt-dlp"));
        assert!(!inv.args.contains(&"--proxy".to_string()));
        assert!(inv.args.contains(&"--socket-timeout".to_string()));
        assert!(inv.args.contains(&"--retries".to_string()));
    }

    #[test]
    fn test_build_telegram_invocation() {
        let driver = driver(Arc::new(MockToolRunner::new()));
        let inv = driver.build_invocation(
            AttemptRoute::DirectFetch,
            1,
            Path::new("/tmp/out.mp4"),
            "https://t.me/c/1",
        );

        assert_eq!(inv.program, PathBuf::from("curl"));
        assert_eq!(inv.args, vec!["-L", "-o", "/tmp/out.mp4", "https://t.me/c/1"]);
    }

    #[tokio::test]
    async fn test_first_attempt_success_uses_proxy() {
        let runner = Arc::new(MockToolRunner::new());
        let driver = driver(Arc::clone(&runner));
        let dir = TempDir::new().unwrap();

        let file = driver
            .retrieve("https://youtu.be/a", Platform::YouTube, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(file.attempts, 1);
        assert!(file.failures.is_empty());
        let calls = runner.invocations().await;
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0].route, AttemptRoute::Proxied(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_direct_on_last_attempt() {
        let runner = Arc::new(MockToolRunner::new());
        runner
            .push_outcomes([
                Ok(ToolOutput::failure(1, "proxy refused")),
                Ok(ToolOutput::failure(1, "proxy refused")),
                Ok(ToolOutput::failure(1, "proxy refused")),
                Ok(ToolOutput::success()),
            ])
            .await;
        let driver = driver(Arc::clone(&runner));
        let dir = TempDir::new().unwrap();

        let file = driver
            .retrieve("https://youtu.be/a", Platform::YouTube, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(file.attempts, 4);
        assert_eq!(file.failures.len(), 3);
        assert!(file.failures.iter().all(|f| f.proxy.is_some()));

        let calls = runner.invocations().await;
        assert_eq!(calls.len(), 4);
        assert!(calls[..3]
            .iter()
            .all(|c| matches!(c.route, AttemptRoute::Proxied(_))));
        assert_eq!(calls[3].route, AttemptRoute::Direct);
    }

    #[tokio::test]
    async fn test_exhaustion_after_bounded_attempts() {
        let runner = Arc::new(MockToolRunner::new());
        runner.set_default_outcome(ToolOutput::failure(2, "HTTP 403")).await;
        let driver = driver(Arc::clone(&runner));
        let dir = TempDir::new().unwrap();

        let err = driver
            .retrieve("https://x.com/a/status/1", Platform::X, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap_err();

        match err {
            RetrievalError::RetrievalExhausted {
                attempts,
                last_cause,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(last_cause.kind(), "ProcessNonZeroExit");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(runner.invocation_count().await, 4);
    }

    #[tokio::test]
    async fn test_launch_failure_is_retried() {
        let runner = Arc::new(MockToolRunner::new());
        runner.push_outcomes([Err(MockToolRunner::launch_error())]).await;
        let driver = driver(Arc::clone(&runner));
        let dir = TempDir::new().unwrap();

        let file = driver
            .retrieve("https://tiktok.com/@a/video/1", Platform::TikTok, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(file.attempts, 2);
        assert_eq!(file.failures[0].kind, "ProcessLaunchFailed");
    }

    #[tokio::test]
    async fn test_telegram_single_attempt_no_proxy() {
        let runner = Arc::new(MockToolRunner::new());
        runner.set_default_outcome(ToolOutput::failure(6, "could not resolve host")).await;
        let driver = driver(Arc::clone(&runner));
        let dir = TempDir::new().unwrap();

        let err = driver
            .retrieve("https://t.me/c/1", Platform::Telegram, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(matches!(err, RetrievalError::ProcessNonZeroExit { .. }));
        let calls = runner.invocations().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].route, AttemptRoute::DirectFetch);
        assert_eq!(calls[0].program, PathBuf::from("curl"));
    }

    #[tokio::test]
    async fn test_single_attempt_bound_goes_direct() {
        let runner = Arc::new(MockToolRunner::new());
        let driver = RetrievalDriver::new(
            fast_config().with_max_attempts(1),
            pool(),
            Arc::clone(&runner) as Arc<dyn ToolRunner>,
        );
        let dir = TempDir::new().unwrap();

        driver
            .retrieve("https://youtu.be/a", Platform::YouTube, dir.path(), &ProgressBar::hidden())
            .await
            .unwrap();

        let calls = runner.invocations().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].route, AttemptRoute::Direct);
    }

    #[tokio::test]
    async fn test_progress_ticks_while_attempt_runs() {
        let runner = Arc::new(MockToolRunner::new());
        runner.set_run_duration(Duration::from_millis(100)).await;
        let driver = RetrievalDriver::new(
            fast_config().with_progress(10, Duration::from_millis(1)),
            pool(),
            Arc::clone(&runner) as Arc<dyn ToolRunner>,
        );
        let dir = TempDir::new().unwrap();
        let bar = ProgressBar::hidden();

        driver
            .retrieve("https://youtu.be/a", Platform::YouTube, dir.path(), &bar)
            .await
            .unwrap();

        assert_eq!(bar.position(), 10);
    }

    #[tokio::test]
    async fn test_ticker_does_not_delay_fast_attempt() {
        let runner = Arc::new(MockToolRunner::new());
        let driver = RetrievalDriver::new(
            fast_config().with_progress(100, Duration::from_secs(10)),
            pool(),
            Arc::clone(&runner) as Arc<dyn ToolRunner>,
        );
        let dir = TempDir::new().unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            driver.retrieve("https://youtu.be/a", Platform::YouTube, dir.path(), &ProgressBar::hidden()),
        )
        .await;

        assert!(result.is_ok(), "progress ticker held up the attempt");
    }
}

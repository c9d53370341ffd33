//! Mock relay for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::relay::{Relay, RelayError, RelayedAsset};

/// Mock implementation of the Relay trait.
///
/// Checks that the file exists at relay time, records the path, and answers
/// with `https://res.cloudinary.com/mock/video/upload/<file name>`.
#[derive(Debug)]
pub struct MockRelay {
    /// Paths relayed so far.
    relayed: Arc<RwLock<Vec<PathBuf>>>,
    /// If set, the next relay will fail with this error.
    next_error: Arc<RwLock<Option<RelayError>>>,
    /// When set, every relay fails.
    always_fail: Arc<RwLock<bool>>,
    /// Simulated upload time.
    delay: Arc<RwLock<Duration>>,
    /// When set, relaying panics, as a crashing task would.
    panic: Arc<RwLock<bool>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRelay {
    pub fn new() -> Self {
        Self {
            relayed: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            always_fail: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            panic: Arc::new(RwLock::new(false)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Reference the mock returns for a relayed file name.
    pub fn reference_for(file_name: &str) -> String {
        format!("https://res.cloudinary.com/mock/video/upload/{}", file_name)
    }

    /// Fail the next relay with `error`.
    pub async fn set_next_error(&self, error: RelayError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every relay fail.
    pub async fn set_always_fail(&self, fail: bool) {
        *self.always_fail.write().await = fail;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Make every relay panic.
    pub async fn set_panic(&self, panic: bool) {
        *self.panic.write().await = panic;
    }

    /// Get all relayed paths.
    pub async fn relayed(&self) -> Vec<PathBuf> {
        self.relayed.read().await.clone()
    }

    pub async fn relayed_count(&self) -> usize {
        self.relayed.read().await.len()
    }

    /// Highest number of relays observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Relay for MockRelay {
    fn name(&self) -> &str {
        "mock"
    }

    async fn relay(&self, path: &Path) -> Result<RelayedAsset, RelayError> {
        if *self.panic.read().await {
            panic!("mock relay panic for {}", path.display());
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self.respond(path).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockRelay {
    async fn respond(&self, path: &Path) -> Result<RelayedAsset, RelayError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if *self.always_fail.read().await {
            return Err(RelayError::Rejected {
                status: 500,
                message: "mock relay failure".to_string(),
            });
        }
        if let Err(e) = tokio::fs::metadata(path).await {
            return Err(RelayError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }

        self.relayed.write().await.push(path.to_path_buf());

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(RelayedAsset::new(Self::reference_for(&file_name)))
    }
}

//! Configuration for the retrieval driver.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for invoking the external fetch tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Path to the curl binary, used for Telegram links.
    #[serde(default = "default_curl_path")]
    pub curl_path: PathBuf,

    /// Total attempts per task, the last one without a proxy.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Socket timeout passed to the tool, in seconds.
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,

    /// Retry count passed to the tool itself.
    #[serde(default = "default_tool_retries")]
    pub tool_retries: u32,

    /// Pause after a failed attempt before the next one.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Number of progress increments per attempt.
    #[serde(default = "default_progress_steps")]
    pub progress_steps: u64,

    /// Interval between progress increments.
    #[serde(default = "default_progress_tick")]
    pub progress_tick_ms: u64,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_curl_path() -> PathBuf {
    PathBuf::from("curl")
}

fn default_max_attempts() -> u32 {
    4
}

fn default_socket_timeout() -> u64 {
    10
}

fn default_tool_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_progress_steps() -> u64 {
    100
}

fn default_progress_tick() -> u64 {
    30
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            curl_path: default_curl_path(),
            max_attempts: default_max_attempts(),
            socket_timeout_secs: default_socket_timeout(),
            tool_retries: default_tool_retries(),
            retry_delay_ms: default_retry_delay(),
            progress_steps: default_progress_steps(),
            progress_tick_ms: default_progress_tick(),
        }
    }
}

impl RetrievalConfig {
    /// Creates a config with custom tool paths.
    pub fn with_paths(ytdlp_path: PathBuf, curl_path: PathBuf) -> Self {
        Self {
            ytdlp_path,
            curl_path,
            ..Default::default()
        }
    }

    /// Sets the attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the cosmetic progress cadence.
    pub fn with_progress(mut self, steps: u64, tick: Duration) -> Self {
        self.progress_steps = steps;
        self.progress_tick_ms = tick.as_millis() as u64;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }
}

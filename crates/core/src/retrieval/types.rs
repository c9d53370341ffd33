//! Types for the retrieval module.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::proxy::ProxyEntry;

/// Transport path used by one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptRoute {
    /// Plain HTTP fetch (Telegram).
    DirectFetch,
    /// Retrieval tool routed through a proxy.
    Proxied(ProxyEntry),
    /// Retrieval tool without a proxy (final fallback).
    Direct,
}

impl AttemptRoute {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptRoute::DirectFetch => "direct_fetch",
            AttemptRoute::Proxied(_) => "proxied",
            AttemptRoute::Direct => "direct",
        }
    }

    pub fn proxy(&self) -> Option<&ProxyEntry> {
        match self {
            AttemptRoute::Proxied(proxy) => Some(proxy),
            _ => None,
        }
    }
}

impl fmt::Display for AttemptRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptRoute::Proxied(proxy) => write!(f, "proxy {}", proxy),
            other => f.write_str(other.label()),
        }
    }
}

/// A fully built command line for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub route: AttemptRoute,
    /// Attempt number, starting at 1.
    pub attempt: u32,
}

/// Captured result of a finished tool process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A successful, silent run.
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    /// A failed run with the given exit code and error text.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Diagnostic record of one failed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptFailure {
    pub attempt: u32,
    pub route: String,
    pub proxy: Option<String>,
    pub kind: &'static str,
    pub message: String,
}

/// A media file fetched to local disk.
#[derive(Debug, Clone)]
pub struct RetrievedFile {
    pub path: PathBuf,
    /// Number of attempts used, including the successful one.
    pub attempts: u32,
    /// Failed attempts that preceded the success.
    pub failures: Vec<AttemptFailure>,
    /// Size on disk, when the tool left a file at the expected path.
    pub size_bytes: Option<u64>,
}

//! Proxy pool construction and selection.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Ports known to tunnel outbound HTTPS reliably.
pub const DEFAULT_ALLOWED_PORTS: &[u16] = &[8080, 3128, 8888, 8081, 6853, 7890, 8443];

/// Scheme prepended to candidates that do not carry one.
const DEFAULT_SCHEME: &str = "http://";

/// Errors raised while building the proxy pool.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The proxy source could not be read.
    #[error("failed to read proxy source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source held no usable proxy.
    #[error("no valid proxies found among {candidates} candidates")]
    Empty { candidates: usize },
}

/// A validated forward proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyEntry {
    /// Scheme-qualified address handed to the retrieval tool.
    pub address: String,
    pub host: String,
    pub port: u16,
}

impl ProxyEntry {
    /// Normalizes and validates one candidate line.
    ///
    /// Returns `None` when the candidate does not parse, has no explicit port,
    /// or uses a port outside `allowed_ports`.
    pub fn parse(candidate: &str, allowed_ports: &[u16]) -> Option<Self> {
        let candidate = candidate.trim();
        let address = if candidate.contains("://") {
            candidate.to_string()
        } else {
            format!("{}{}", DEFAULT_SCHEME, candidate)
        };

        let url = Url::parse(&address).ok()?;
        let host = url.host_str()?.to_string();
        let port = url.port()?;

        if !allowed_ports.contains(&port) {
            return None;
        }

        Some(Self {
            address: address.trim_end_matches('/').to_string(),
            host,
            port,
        })
    }
}

impl fmt::Display for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Immutable pool of proxies with uniform random selection.
#[derive(Debug, Clone)]
pub struct ProxyPool {
    entries: Vec<ProxyEntry>,
}

impl ProxyPool {
    /// Loads the pool from a file, one candidate per line.
    pub fn load(path: &Path, allowed_ports: &[u16]) -> Result<Self, ProxyError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ProxyError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let pool = Self::from_lines(&contents, allowed_ports)?;
        info!("Loaded {} proxies from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Builds a shuffled pool from line-oriented text.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn from_lines(source: &str, allowed_ports: &[u16]) -> Result<Self, ProxyError> {
        let mut candidates = 0;
        let mut entries = Vec::new();

        for line in source.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            candidates += 1;
            match ProxyEntry::parse(line, allowed_ports) {
                Some(entry) => entries.push(entry),
                None => debug!("Discarding proxy candidate: {}", line),
            }
        }

        if entries.is_empty() {
            return Err(ProxyError::Empty { candidates });
        }

        let mut rng = StdRng::from_entropy();
        entries.shuffle(&mut rng);

        Ok(Self { entries })
    }

    /// Builds a pool from already validated entries, keeping their order.
    pub fn from_entries(entries: Vec<ProxyEntry>) -> Result<Self, ProxyError> {
        if entries.is_empty() {
            return Err(ProxyError::Empty { candidates: 0 });
        }
        Ok(Self { entries })
    }

    /// Picks a proxy uniformly at random, with replacement.
    pub fn choose(&self) -> &ProxyEntry {
        self.choose_with(&mut rand::thread_rng())
    }

    /// Picks a proxy using the supplied random source.
    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &ProxyEntry {
        &self.entries[rng.gen_range(0..self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed pool.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ProxyEntry] {
        &self.entries
    }
}

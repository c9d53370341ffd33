//! Trait definitions for the relay module.

use async_trait::async_trait;
use std::path::Path;

use super::error::RelayError;
use super::types::RelayedAsset;

/// A remote service that accepts a local file and keeps a durable copy.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Returns the name of this relay implementation.
    fn name(&self) -> &str;

    /// Uploads the file at `path` and returns where it can be found.
    ///
    /// The local file is left untouched; removing it is the caller's job.
    async fn relay(&self, path: &Path) -> Result<RelayedAsset, RelayError>;
}

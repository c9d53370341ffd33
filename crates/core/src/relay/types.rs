//! Types for the relay module.

use serde::{Deserialize, Serialize};

/// A file accepted by the relay service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayedAsset {
    /// Durable reference location of the uploaded asset.
    pub reference: String,
    /// Service-side identifier, when the service returns one.
    pub public_id: Option<String>,
    /// Stored size as reported by the service.
    pub bytes: Option<u64>,
}

impl RelayedAsset {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            public_id: None,
            bytes: None,
        }
    }
}

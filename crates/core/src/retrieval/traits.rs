//! Trait definitions for the retrieval module.

use async_trait::async_trait;

use super::error::RetrievalError;
use super::types::{ToolInvocation, ToolOutput};

/// Runs one invocation of an external fetch tool.
///
/// Implementations capture the process output and return it whatever the exit
/// status; only a failure to start the process is an error.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs the invocation to completion.
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RetrievalError>;
}

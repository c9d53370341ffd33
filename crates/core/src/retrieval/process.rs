//! Tool runner backed by real child processes.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::error::RetrievalError;
use super::traits::ToolRunner;
use super::types::{ToolInvocation, ToolOutput};

/// Spawns the fetch tool as a child process and captures its output.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Asks a tool for its version string (`<program> --version`).
    pub async fn tool_version(&self, program: &Path) -> Result<String, RetrievalError> {
        let output = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RetrievalError::ProcessLaunchFailed {
                program: program.to_path_buf(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            return Err(RetrievalError::non_zero_exit(
                program,
                output.status.code(),
                stdout,
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(stdout)
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RetrievalError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RetrievalError::ProcessLaunchFailed {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

//! `tokio::process` implementation of [`ToolRunner`]

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{ToolInvocation, ToolOutput, ToolRunner};
use crate::error::{VaultError, VaultResult};

/// Spawns the CLI as a child process
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Creates a runner without a timeout
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Creates a runner that kills the child after `timeout`
    #[must_use]
    pub const fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn build_command(invocation: &ToolInvocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out future drops the child; make sure it dies with it
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ToolRunner for CommandRunner {
    async fn execute(&self, invocation: ToolInvocation) -> VaultResult<ToolOutput> {
        trace!(command = ?invocation, "Spawning vault CLI");

        let mut child = Self::build_command(&invocation).spawn().map_err(|e| {
            VaultError::ToolUnavailable(format!("Failed to run {}: {e}", invocation.program))
        })?;

        if let Some(input) = invocation.stdin.as_deref()
            && let Some(mut writer) = child.stdin.take()
        {
            writer
                .write_all(input.as_bytes())
                .await
                .map_err(|e| VaultError::ToolError(format!("Failed to write stdin: {e}")))?;
            // Closing stdin signals EOF to the child
            drop(writer);
        }

        let waiting = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, waiting)
                .await
                .map_err(|_| VaultError::ToolTimeout(limit.as_secs()))?,
            None => waiting.await,
        }
        .map_err(|e| VaultError::ToolError(format!("Failed to read CLI output: {e}")))?;

        let result = ToolOutput::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
            output.status.code().unwrap_or(-1),
        );
        debug!(
            command = invocation.command_name(),
            exit_code = result.exit_code,
            "Vault CLI finished"
        );
        Ok(result)
    }
}

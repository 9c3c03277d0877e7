//! Subprocess primitive for the vault CLI
//!
//! [`ToolRunner`] is the only seam through which the core spawns processes.
//! [`CommandRunner`] is the production implementation on top of
//! `tokio::process`; tests substitute `ScriptedRunner` from the
//! `test-util` feature.

mod command;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::VaultResult;

pub use command::CommandRunner;

/// Argument that carries the session token
pub const SESSION_FLAG: &str = "--session";

const REDACTED: &str = "[REDACTED]";

/// A single CLI invocation
#[derive(Clone, Default)]
pub struct ToolInvocation {
    /// Executable to run
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Environment overrides on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Data written to stdin before it is closed
    pub stdin: Option<String>,
    /// Indices into `args` that must never be displayed
    sensitive: Vec<usize>,
}

impl ToolInvocation {
    /// Creates an invocation of `program` with no arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends an argument that is redacted from `Debug` output
    #[must_use]
    pub fn sensitive_arg(mut self, arg: impl Into<String>) -> Self {
        self.sensitive.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Appends `--session <token>`
    #[must_use]
    pub fn session(self, token: &str) -> Self {
        self.arg(SESSION_FLAG).sensitive_arg(token)
    }

    /// Adds an environment override
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Adds several environment overrides
    #[must_use]
    pub fn envs(mut self, vars: BTreeMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Sets stdin content
    #[must_use]
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Returns true if the argument at `index` is redacted
    #[must_use]
    pub fn is_sensitive(&self, index: usize) -> bool {
        self.sensitive.contains(&index)
    }

    /// Returns true if this invocation carries a session token
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.args.iter().any(|a| a == SESSION_FLAG)
    }

    /// Arguments with sensitive values replaced, for logging
    #[must_use]
    pub fn display_args(&self) -> Vec<&str> {
        self.args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if self.is_sensitive(i) {
                    REDACTED
                } else {
                    a.as_str()
                }
            })
            .collect()
    }

    /// First argument, used as the command name in logs
    #[must_use]
    pub fn command_name(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }
}

impl fmt::Debug for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolInvocation")
            .field("program", &self.program)
            .field("args", &self.display_args())
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("stdin", &self.stdin.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// stdout, trimmed
    pub stdout: String,
    /// stderr, trimmed
    pub stderr: String,
    /// Exit code, `-1` when the process was killed by a signal
    pub exit_code: i32,
}

impl ToolOutput {
    /// Creates an output, trimming both streams
    #[must_use]
    pub fn new(stdout: impl AsRef<str>, stderr: impl AsRef<str>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.as_ref().trim().to_string(),
            stderr: stderr.as_ref().trim().to_string(),
            exit_code,
        }
    }

    /// Successful output with the given stdout
    #[must_use]
    pub fn ok(stdout: impl AsRef<str>) -> Self {
        Self::new(stdout, "", 0)
    }

    /// Failed output with the given stderr
    #[must_use]
    pub fn failed(stderr: impl AsRef<str>, exit_code: i32) -> Self {
        Self::new("", stderr, exit_code)
    }

    /// Returns true for exit code 0
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Best error description: stderr, then stdout, then the exit code
    #[must_use]
    pub fn error_message(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            format!("exit code {}", self.exit_code)
        }
    }
}

/// Executes vault CLI invocations
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs the invocation to completion.
    ///
    /// A non-zero exit is *not* an error at this level; callers inspect
    /// [`ToolOutput::exit_code`].
    ///
    /// # Errors
    /// `ToolUnavailable` when the executable cannot be started,
    /// `ToolTimeout` when a configured timeout expires, `ToolError` for
    /// I/O failures while talking to the child.
    async fn execute(&self, invocation: ToolInvocation) -> VaultResult<ToolOutput>;
}

//! Tracing setup for structured logging
//!
//! The core only emits `tracing` events; hosts call [`init_tracing`] once at
//! startup to decide where they go. Session tokens and passwords are never
//! recorded as fields.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable with filter directives, e.g.
/// `BWPALETTE_LOG=bwpalette_core::totp=trace`
pub const LOG_ENV: &str = "BWPALETTE_LOG";

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Verbosity of the `bwpalette` targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Only failures
    Error,
    /// Failures and skipped refreshes (default)
    #[default]
    Warn,
    /// Session transitions and sync results
    Info,
    /// Every vault command and scheduler phase change
    Debug,
    /// Process spawns and per-tick countdown values
    Trace,
}

impl TracingLevel {
    /// Level for a `-v` count: none is warn, then info, debug, trace
    #[must_use]
    pub const fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log lines go
///
/// Hosts that print data on stdout (the CLI) keep logs on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
}

/// Configuration for [`init_tracing`]
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Level for the `bwpalette` targets
    pub level: TracingLevel,
    /// Output destination
    pub output: TracingOutput,
    /// Explicit filter directives; wins over [`LOG_ENV`] and `level`
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Creates a new tracing configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub const fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets explicit filter directives
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Directives derived from the level, covering the core and the CLI
    #[must_use]
    pub fn directives(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| format!("bwpalette_core={0},bwpalette={0}", self.level))
    }
}

/// Installs the global subscriber.
///
/// Filter precedence: [`TracingConfig::filter`], then [`LOG_ENV`], then the
/// configured level.
///
/// # Errors
///
/// `AlreadyInitialized` on a second call, `InitializationFailed` if the
/// explicit filter does not parse or another subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = match &config.filter {
        Some(custom) => EnvFilter::try_new(custom)
            .map_err(|e| TracingError::InitializationFailed(e.to_string()))?,
        None => EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(config.directives()))
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let writer = match config.output {
        TracingOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        TracingOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, "Tracing initialized");
    Ok(())
}

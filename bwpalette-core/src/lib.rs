//! `bwpalette` Core Library
//!
//! Session handling and TOTP refresh on top of the Bitwarden CLI (`bw`),
//! for launcher and command-palette style front ends.
//!
//! # Crate Structure
//!
//! - [`session`] - [`SessionStore`]: the session token and every vault operation
//! - [`process`] - the subprocess seam ([`ToolRunner`]) and its `tokio::process` implementation
//! - [`totp`] - countdown math and [`TotpRefreshScheduler`]
//! - [`palette`] - display rows, filters, icons and the cached [`VaultView`]
//! - [`models`] - JSON models of `bw` output
//! - [`config`] - [`ToolSettings`]
//! - [`tracing`] - subscriber setup for hosts
//! - `testing` - `ScriptedRunner`, a `ToolRunner` double (`test-util` feature)

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod models;
pub mod palette;
pub mod process;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod totp;
pub mod tracing;

pub use config::{ToolSettings, UnlockMode, parse_custom_environment};
pub use error::{BwPaletteError, ConfigError, ConfigResult, VaultError, VaultResult};
pub use models::{
    Folder, ItemType, PassphraseOptions, PasswordOptions, VaultItem, VaultState, VaultStatus,
};
pub use palette::{DisplayItem, ItemAction, VaultFilter, VaultView, ViewEvent};
pub use process::{CommandRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use session::SessionStore;
#[cfg(any(test, feature = "test-util"))]
pub use testing::ScriptedRunner;
pub use totp::{
    Clock, ManualClock, OtpEntry, SchedulerPhase, SystemClock, TotpEvent, TotpRefreshScheduler,
    TotpSource, remaining_seconds, window_index,
};
pub use tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, init_tracing,
};

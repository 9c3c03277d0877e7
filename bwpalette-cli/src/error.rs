//! CLI error types and exit codes.

use bwpalette_core::VaultError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, invalid input, or a failed vault command
    pub const GENERAL_ERROR: i32 = 1;
    /// The vault is locked or the master password was rejected
    pub const VAULT_LOCKED: i32 = 2;
    /// The `bw` executable could not be started
    pub const TOOL_UNAVAILABLE: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad user input (JSON, filter ids, ...)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Error from the vault CLI
    #[error("{}", .0.user_message())]
    Vault(#[from] VaultError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bwpalette_core::ConfigError> for CliError {
    fn from(err: bwpalette_core::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, input, vault command, IO)
    /// - 2: Vault locked or unlock rejected
    /// - 3: `bw` not available
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Vault(VaultError::NotUnlocked | VaultError::WrongSecret(_)) => {
                exit_codes::VAULT_LOCKED
            }
            Self::Vault(VaultError::ToolUnavailable(_)) => exit_codes::TOOL_UNAVAILABLE,
            Self::Vault(_) | Self::Config(_) | Self::Input(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}

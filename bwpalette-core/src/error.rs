//! Error types for `bwpalette`
//!
//! Every session store operation returns [`VaultResult`]. The variants map
//! one-to-one onto the ways a call to the Bitwarden CLI can go wrong, so a host
//! can decide whether to prompt for unlock, ask for configuration, or just show
//! a message.

use thiserror::Error;

/// Errors produced while talking to the vault CLI
#[derive(Debug, Error)]
pub enum VaultError {
    /// The executable could not be started (not installed, not on `PATH`, ...)
    #[error("Vault CLI not available: {0}")]
    ToolUnavailable(String),

    /// The CLI ran but exited non-zero or returned an error-shaped response
    #[error("Vault CLI command failed: {0}")]
    ToolError(String),

    /// The CLI did not finish within the configured timeout
    #[error("Vault CLI command timed out after {0} seconds")]
    ToolTimeout(u64),

    /// stdout did not have the expected JSON shape
    #[error("Failed to parse {what}: {message}")]
    ParseError {
        /// What was being parsed (e.g. "status", "items")
        what: &'static str,
        /// Parser diagnostic
        message: String,
    },

    /// A session-scoped operation was requested while no session is held
    #[error("Vault is locked")]
    NotUnlocked,

    /// The unlock attempt was rejected
    #[error("Unlock rejected: {0}")]
    WrongSecret(String),

    /// A request payload could not be serialized
    #[error("Failed to encode payload: {0}")]
    Encode(String),
}

/// Result type for vault operations
pub type VaultResult<T> = std::result::Result<T, VaultError>;

impl VaultError {
    /// Creates a parse error for the given output kind
    pub fn parse(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ParseError {
            what,
            message: err.to_string(),
        }
    }

    /// Returns true if prompting for unlock may resolve this error
    #[must_use]
    pub const fn needs_unlock(&self) -> bool {
        matches!(self, Self::NotUnlocked | Self::WrongSecret(_))
    }

    /// Returns true if the error stems from the CLI installation itself
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::ToolUnavailable(_))
    }

    /// Message suitable for showing to the user.
    ///
    /// Tool and parse failures share a generic prefix with the underlying
    /// error appended; unlock rejections show the tool's own message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ToolUnavailable(_) => "Bitwarden CLI is not available".to_string(),
            Self::NotUnlocked => "Vault is locked. Unlock it first.".to_string(),
            Self::WrongSecret(msg) if msg.trim().is_empty() => {
                "Failed to unlock vault".to_string()
            }
            Self::WrongSecret(msg) => msg.clone(),
            Self::ToolTimeout(secs) => {
                format!("Operation failed: no response from Bitwarden CLI after {secs}s")
            }
            Self::ToolError(msg) => format!("Operation failed: {msg}"),
            Self::ParseError { .. } | Self::Encode(_) => format!("Operation failed: {self}"),
        }
    }
}

/// Errors related to settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting value is invalid
    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Settings could not be (de)serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error for the crate
#[derive(Debug, Error)]
pub enum BwPaletteError {
    /// Vault CLI error
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Settings for launching the Bitwarden CLI

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Executable used when no override is configured (resolved through `PATH`)
pub const DEFAULT_EXECUTABLE: &str = "bw";

/// Environment variable carrying the API key client id
pub const CLIENT_ID_ENV: &str = "BW_CLIENTID";

/// Environment variable carrying the API key client secret
pub const CLIENT_SECRET_ENV: &str = "BW_CLIENTSECRET";

/// Environment variable used to hand the master password to `bw unlock`
pub const PASSWORD_ENV: &str = "BW_PASSWORD";

/// How the master password reaches `bw unlock`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMode {
    /// `--passwordenv BW_PASSWORD`; keeps the secret out of the process list
    #[default]
    Environment,
    /// Positional argument, as older CLI versions require
    Argument,
}

/// Vault CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Path to the `bw` executable, `~` is expanded
    pub executable: String,
    /// Extra environment in `KEY=VALUE;KEY=VALUE` form
    pub custom_environment: String,
    /// Personal API key client id
    pub client_id: Option<String>,
    /// Personal API key client secret (never serialized)
    #[serde(skip)]
    pub client_secret: Option<SecretString>,
    /// Per-call timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
    /// Master password transport for unlock
    pub unlock_mode: UnlockMode,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            custom_environment: String::new(),
            client_id: None,
            client_secret: None,
            timeout_secs: None,
            unlock_mode: UnlockMode::default(),
        }
    }
}

impl ToolSettings {
    /// Creates settings with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executable path
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Sets the custom environment string
    #[must_use]
    pub fn with_custom_environment(mut self, env: impl Into<String>) -> Self {
        self.custom_environment = env.into();
        self
    }

    /// Sets the API key credentials
    #[must_use]
    pub fn with_api_key(mut self, client_id: impl Into<String>, client_secret: SecretString) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret);
        self
    }

    /// Sets the per-call timeout
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the unlock transport
    #[must_use]
    pub const fn with_unlock_mode(mut self, mode: UnlockMode) -> Self {
        self.unlock_mode = mode;
        self
    }

    /// Per-call timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Executable path with `~` and `$VAR` expanded where possible
    #[must_use]
    pub fn resolved_executable(&self) -> String {
        shellexpand::full(self.executable.trim())
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| self.executable.trim().to_string())
    }

    /// Environment overrides for every CLI invocation.
    ///
    /// API key credentials come first; custom pairs are applied afterwards
    /// and win on conflicts.
    #[must_use]
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();

        if let Some(id) = self.client_id.as_deref().map(str::trim)
            && !id.is_empty()
        {
            env.insert(CLIENT_ID_ENV.to_string(), id.to_string());
        }
        if let Some(secret) = &self.client_secret {
            let secret = secret.expose_secret().trim();
            if !secret.is_empty() {
                env.insert(CLIENT_SECRET_ENV.to_string(), secret.to_string());
            }
        }

        env.extend(parse_custom_environment(&self.custom_environment));
        env
    }

    /// Validates the settings
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for an empty executable or a zero timeout
    pub fn validate(&self) -> ConfigResult<()> {
        if self.executable.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "executable",
                reason: "must not be empty".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses a `KEY=VALUE;KEY=VALUE` string.
///
/// Keys and values are trimmed, the value may itself contain `=`. Pairs
/// without `=` or with an empty key are skipped.
#[must_use]
pub fn parse_custom_environment(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

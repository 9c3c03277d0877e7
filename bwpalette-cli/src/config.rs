//! Persistent settings for the `bwpalette` binary.
//!
//! Settings live in `settings.toml` inside the configuration directory
//! (`$XDG_CONFIG_HOME/bwpalette` by default). The API key client secret is
//! never written; it comes from `BW_CLIENTSECRET` at run time.

use std::fs;
use std::path::PathBuf;

use bwpalette_core::{ToolSettings, VaultFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliError;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BWPALETTE_CONFIG_DIR";

const SETTINGS_FILE: &str = "settings.toml";

/// Everything the binary persists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Filter id used by `list` when none is given on the command line
    pub default_filter: Option<String>,
    /// How to run `bw`
    pub vault: ToolSettings,
}

impl HostSettings {
    /// Filter to apply when the user did not pick one
    #[must_use]
    pub fn default_filter(&self) -> VaultFilter {
        self.default_filter
            .as_deref()
            .map_or_else(VaultFilter::default, VaultFilter::from_id)
    }
}

/// Loads and saves [`HostSettings`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses `BWPALETTE_CONFIG_DIR` or the platform configuration directory
    ///
    /// # Errors
    /// Returns an error if no configuration directory can be determined
    pub fn new() -> Result<Self, CliError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::with_config_dir(PathBuf::from(dir)));
        }
        let base = dirs::config_dir()
            .ok_or_else(|| CliError::Config("no configuration directory found".to_string()))?;
        Ok(Self::with_config_dir(base.join("bwpalette")))
    }

    /// Uses an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Reads the settings; a missing file yields the defaults
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_settings(&self) -> Result<HostSettings, CliError> {
        let path = self.settings_path();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(HostSettings::default());
        }
        let content = fs::read_to_string(&path)?;
        let settings: HostSettings = toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("Failed to parse {}: {e}", path.display())))?;
        settings.vault.validate()?;
        Ok(settings)
    }

    /// Writes the settings, creating the directory if needed
    ///
    /// # Errors
    /// Returns an error if the settings are invalid or cannot be written
    pub fn save_settings(&self, settings: &HostSettings) -> Result<(), CliError> {
        settings.vault.validate()?;
        fs::create_dir_all(&self.config_dir)?;
        let content = toml::to_string_pretty(settings)
            .map_err(|e| CliError::Config(format!("Failed to serialize settings: {e}")))?;
        fs::write(self.settings_path(), content)?;
        debug!(path = %self.settings_path().display(), "Settings saved");
        Ok(())
    }
}

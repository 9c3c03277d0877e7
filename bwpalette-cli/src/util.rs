//! Shared utility functions used across command modules.

use std::fmt::Write as _;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use bwpalette_core::{SessionStore, VaultFilter};
use secrecy::SecretString;
use serde_json::Value;

use crate::config::{ConfigManager, HostSettings};
use crate::error::CliError;

/// Global options every command handler needs
#[derive(Debug, Default)]
pub struct Context {
    /// `--config` override
    pub config_path: Option<PathBuf>,
    /// `--session` / `BW_SESSION`
    pub session: Option<String>,
    /// `--quiet`
    pub quiet: bool,
}

impl Context {
    /// Loads the persisted settings
    ///
    /// # Errors
    /// Returns an error if the settings file is unreadable or invalid
    pub fn settings(&self) -> Result<HostSettings, CliError> {
        create_config_manager(self.config_path.as_deref())?.load_settings()
    }

    /// Builds a session store from the settings, adopting the session token
    /// from the command line or environment
    ///
    /// # Errors
    /// Returns an error if the settings cannot be loaded
    pub fn store(&self) -> Result<SessionStore, CliError> {
        let settings = self.settings()?;
        Ok(self.store_with(&settings))
    }

    /// Like [`Self::store`] with already loaded settings
    #[must_use]
    pub fn store_with(&self, settings: &HostSettings) -> SessionStore {
        let store = SessionStore::new(settings.vault.clone());
        if let Some(token) = self.session.as_deref() {
            store.adopt_session(SecretString::from(token.to_string()));
        }
        store
    }

    /// Prints an informational line unless `--quiet` is set
    pub fn note(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }
}

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new(),
    }
}

/// Runs a future to completion on a fresh Tokio runtime
///
/// # Errors
/// Returns an error if the runtime cannot be built, or whatever the future
/// returns
pub fn block_on<F, T>(future: F) -> Result<T, CliError>
where
    F: std::future::Future<Output = Result<T, CliError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

/// Parses a filter id, rejecting ids that are not recognized
pub fn parse_filter(id: &str) -> Result<VaultFilter, CliError> {
    let filter = VaultFilter::from_id(id);
    if filter.id() == id.trim() {
        Ok(filter)
    } else {
        Err(CliError::Input(format!("unknown filter '{id}'")))
    }
}

/// Parses a JSON argument; `-` reads it from stdin
pub fn read_json_arg(arg: &str) -> Result<Value, CliError> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_string()
    };
    serde_json::from_str(&text).map_err(|e| CliError::Input(format!("invalid JSON: {e}")))
}

/// Formats rows as aligned columns under a header
#[must_use]
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_row(&mut output, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut output, rule.iter().map(String::as_str), &widths);
    for row in rows {
        push_row(&mut output, row.iter().map(String::as_str), &widths);
    }
    output
}

fn push_row<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(output, "{}", line.join("  ").trim_end());
}

//! Settings commands.

use bwpalette_core::UnlockMode;

use crate::cli::{ConfigCommands, SettingKey};
use crate::config::HostSettings;
use crate::error::CliError;
use crate::util::{Context, create_config_manager, parse_filter};

/// Config command handler
pub fn cmd_config(ctx: &Context, subcmd: ConfigCommands) -> Result<(), CliError> {
    let manager = create_config_manager(ctx.config_path.as_deref())?;
    match subcmd {
        ConfigCommands::Show => {
            let settings = manager.load_settings()?;
            let text = toml::to_string_pretty(&settings)
                .map_err(|e| CliError::Config(format!("Failed to serialize settings: {e}")))?;
            print!("{text}");
        }
        ConfigCommands::Set { key, value } => {
            let mut settings = manager.load_settings()?;
            apply_setting(&mut settings, key, &value)?;
            manager.save_settings(&settings)?;
            ctx.note(format!("Saved {}", manager.settings_path().display()));
        }
        ConfigCommands::Path => println!("{}", manager.settings_path().display()),
    }
    Ok(())
}

/// Applies one `config set` change
pub fn apply_setting(
    settings: &mut HostSettings,
    key: SettingKey,
    value: &str,
) -> Result<(), CliError> {
    let value = value.trim();
    let optional = (!value.is_empty()).then(|| value.to_string());
    match key {
        SettingKey::Executable => {
            settings.vault.executable = optional.unwrap_or_else(|| "bw".to_string());
        }
        SettingKey::CustomEnvironment => settings.vault.custom_environment = value.to_string(),
        SettingKey::ClientId => settings.vault.client_id = optional,
        SettingKey::Timeout => {
            settings.vault.timeout_secs = optional
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|_| CliError::Input(format!("invalid timeout '{v}'")))
                })
                .transpose()?;
        }
        SettingKey::UnlockMode => {
            settings.vault.unlock_mode = match value {
                "environment" | "env" => UnlockMode::Environment,
                "argument" | "arg" => UnlockMode::Argument,
                other => {
                    return Err(CliError::Input(format!(
                        "unknown unlock mode '{other}' (expected environment or argument)"
                    )));
                }
            };
        }
        SettingKey::DefaultFilter => {
            settings.default_filter = optional
                .map(|id| parse_filter(&id).map(|f| f.id()))
                .transpose()?;
        }
    }
    Ok(())
}

//! Vault status command.

use bwpalette_core::VaultStatus;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{Context, block_on};

/// Status command handler
pub fn cmd_status(ctx: &Context, format: OutputFormat) -> Result<(), CliError> {
    let store = ctx.store()?;
    let (status, version) = block_on(async {
        let status = store.status().await?;
        let version = store.version().await.ok();
        Ok((status, version))
    })?;

    match format {
        OutputFormat::Table => {
            println!(
                "{}",
                format_status(&status, version.as_deref(), store.is_unlocked())
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&status)
                .map_err(|e| CliError::Input(format!("Failed to serialize status: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Human readable status block
#[must_use]
pub fn format_status(status: &VaultStatus, version: Option<&str>, has_session: bool) -> String {
    let last_sync = status.last_sync.map_or_else(
        || "never".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    [
        format!("Status:      {}", status.state),
        format!("Account:     {}", status.user_email.as_deref().unwrap_or("-")),
        format!("Server:      {}", status.server_url.as_deref().unwrap_or("default")),
        format!("Last sync:   {last_sync}"),
        format!("Session:     {}", if has_session { "provided" } else { "none" }),
        format!("bw version:  {}", version.unwrap_or("unknown")),
    ]
    .join("\n")
}

//! Unlock, lock, sync and API key login.

use bwpalette_core::VaultError;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::CliError;
use crate::util::{Context, block_on};

/// Unlock command handler.
///
/// The master password comes from `password_env` when given, otherwise it is
/// prompted for without echo. The session token goes to stdout so it can be
/// captured by the shell.
pub fn cmd_unlock(ctx: &Context, password_env: Option<&str>, export: bool) -> Result<(), CliError> {
    let password = read_master_password(password_env)?;
    let store = ctx.store()?;

    block_on(async { Ok(store.unlock(&password).await?) })?;

    let token = store
        .session_token()
        .ok_or_else(|| CliError::Vault(VaultError::NotUnlocked))?;
    if export {
        println!("export BW_SESSION=\"{}\"", token.expose_secret());
    } else {
        println!("{}", token.expose_secret());
    }
    ctx.note("Vault unlocked.");
    Ok(())
}

fn read_master_password(password_env: Option<&str>) -> Result<SecretString, CliError> {
    let password = match password_env {
        Some(var) => std::env::var(var)
            .map_err(|_| CliError::Input(format!("environment variable {var} is not set")))?,
        None => rpassword::prompt_password("Master password: ")?,
    };
    if password.is_empty() {
        return Err(CliError::Input("master password must not be empty".to_string()));
    }
    Ok(SecretString::from(password))
}

/// Lock command handler
pub fn cmd_lock(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store()?;
    block_on(async { Ok(store.lock().await?) })?;
    ctx.note("Vault locked.");
    Ok(())
}

/// Sync command handler
pub fn cmd_sync(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store()?;
    block_on(async { Ok(store.sync().await?) })?;
    ctx.note("Vault synced.");
    Ok(())
}

/// API key login command handler
pub fn cmd_login_apikey(
    ctx: &Context,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> Result<(), CliError> {
    let mut settings = ctx.settings()?;
    let client_id = client_id
        .map(str::to_string)
        .or_else(|| settings.vault.client_id.clone())
        .ok_or_else(|| CliError::Input("no API key client id configured".to_string()))?;
    let client_secret = client_secret
        .ok_or_else(|| CliError::Input("BW_CLIENTSECRET is not set".to_string()))?;

    debug!(%client_id, "Logging in with API key");
    settings.vault = settings
        .vault
        .with_api_key(client_id, SecretString::from(client_secret.to_string()));
    let store = ctx.store_with(&settings);
    block_on(async { Ok(store.login_with_api_key().await?) })?;
    ctx.note("Logged in. Run `bwpalette unlock` next.");
    Ok(())
}

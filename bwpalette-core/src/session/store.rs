//! Session-holding facade over the Bitwarden CLI
//!
//! [`SessionStore`] owns the (optional) session token and turns every vault
//! operation into a single `bw` invocation, or two for edits. The token is
//! only ever read by the argument builder and is never logged.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::payload::{encode_payload, merge_fields};
use super::token::extract_session_token;
use crate::config::{PASSWORD_ENV, ToolSettings, UnlockMode};
use crate::error::{VaultError, VaultResult};
use crate::models::{Folder, PassphraseOptions, PasswordOptions, VaultItem, VaultStatus};
use crate::process::{CommandRunner, ToolInvocation, ToolOutput, ToolRunner};
use crate::totp::TotpSource;

/// Phrases `bw unlock` uses when it rejects the master password
const REJECTION_MARKERS: [&str; 2] = ["invalid master password", "invalid password"];

/// Folder argument the CLI understands as "items without a folder"
const NO_FOLDER: &str = "null";

/// Vault session and CLI facade
///
/// Share one instance per vault via `Arc`. Unlock and lock are serialized by
/// an async gate; everything else reads the current token and runs
/// concurrently.
pub struct SessionStore {
    runner: Arc<dyn ToolRunner>,
    settings: ToolSettings,
    token: RwLock<Option<SecretString>>,
    transition: Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("executable", &self.settings.executable)
            .field("unlocked", &self.is_unlocked())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a locked store that spawns the real CLI
    #[must_use]
    pub fn new(settings: ToolSettings) -> Self {
        let runner = Arc::new(CommandRunner::with_timeout(settings.timeout()));
        Self::with_runner(settings, runner)
    }

    /// Creates a locked store on top of a custom runner
    #[must_use]
    pub fn with_runner(settings: ToolSettings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            settings,
            token: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    /// Settings this store was created with
    #[must_use]
    pub const fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Returns true while a session token is held.
    ///
    /// Purely local: the tool may still consider the session invalid.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }

    /// Returns a copy of the session token, if any
    #[must_use]
    pub fn session_token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adopts a token obtained elsewhere (e.g. an exported `BW_SESSION`).
    ///
    /// Blank tokens are ignored.
    pub fn adopt_session(&self, token: SecretString) {
        if token.expose_secret().trim().is_empty() {
            return;
        }
        self.set_token(Some(token));
        debug!("Adopted existing vault session");
    }

    /// Forgets the session token without contacting the tool
    pub fn clear_session(&self) {
        self.set_token(None);
    }

    fn set_token(&self, token: Option<SecretString>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn invocation<I, S>(&self, args: I) -> ToolInvocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolInvocation::new(self.settings.resolved_executable())
            .envs(self.settings.environment())
            .args(args)
    }

    /// Builds a session-scoped invocation, failing fast when locked
    fn session_invocation<I, S>(&self, args: I) -> VaultResult<ToolInvocation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        let token = guard
            .as_ref()
            .map(|t| t.expose_secret())
            .filter(|t| !t.is_empty())
            .ok_or(VaultError::NotUnlocked)?;
        Ok(self.invocation(args).session(token))
    }

    /// Runs an invocation, mapping a non-zero exit to `ToolError`
    async fn run(&self, invocation: ToolInvocation) -> VaultResult<ToolOutput> {
        let command = invocation.command_name().to_string();
        let output = self.runner.execute(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            let message = output.error_message();
            warn!(%command, exit_code = output.exit_code, "Vault CLI command failed: {message}");
            Err(VaultError::ToolError(message))
        }
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        what: &'static str,
        invocation: ToolInvocation,
    ) -> VaultResult<T> {
        let command = invocation.command_name().to_string();
        let output = self.run(invocation).await?;
        serde_json::from_str(&output.stdout).map_err(|e| {
            warn!(%command, "Failed to parse {what} from vault CLI output: {e}");
            VaultError::parse(what, e)
        })
    }

    /// Queries `bw status`
    ///
    /// # Errors
    /// `ToolUnavailable` if the CLI cannot be started, `ToolError` on a
    /// non-zero exit, `ParseError` on unexpected output
    #[instrument(skip(self))]
    pub async fn status(&self) -> VaultResult<VaultStatus> {
        self.run_json("status", self.invocation(["status"])).await
    }

    /// Returns the CLI version string
    ///
    /// # Errors
    /// `ToolUnavailable` if the CLI cannot be started
    #[instrument(skip(self))]
    pub async fn version(&self) -> VaultResult<String> {
        let output = self.run(self.invocation(["--version"])).await?;
        Ok(output.stdout)
    }

    /// Unlocks the vault and stores the resulting session token.
    ///
    /// On any failure the previously held token (if any) is kept.
    ///
    /// # Errors
    /// `WrongSecret` when the tool rejects the password, `ToolError` for
    /// other failures (including success without a recognizable token)
    #[instrument(skip(self, master_password))]
    pub async fn unlock(&self, master_password: &SecretString) -> VaultResult<()> {
        let _gate = self.transition.lock().await;

        let invocation = match self.settings.unlock_mode {
            UnlockMode::Environment => self
                .invocation(["unlock", "--passwordenv", PASSWORD_ENV])
                .env(PASSWORD_ENV, master_password.expose_secret()),
            UnlockMode::Argument => self
                .invocation(["unlock"])
                .sensitive_arg(master_password.expose_secret()),
        }
        .arg("--raw");

        let output = self.runner.execute(invocation).await?;

        if let Some(token) = extract_session_token(&output) {
            self.set_token(Some(SecretString::from(token)));
            info!("Vault unlocked");
            return Ok(());
        }

        if output.success() {
            warn!("Unlock succeeded but no session token was found in the output");
            return Err(VaultError::ToolError(
                "unlock returned no session token".to_string(),
            ));
        }

        let message = output.error_message();
        let lowered = message.to_lowercase();
        if REJECTION_MARKERS.iter().any(|m| lowered.contains(m)) {
            info!("Unlock rejected");
            Err(VaultError::WrongSecret(message))
        } else {
            warn!(exit_code = output.exit_code, "Unlock failed: {message}");
            Err(VaultError::ToolError(message))
        }
    }

    /// Locks the vault; clears the token when the tool reports success
    ///
    /// # Errors
    /// `ToolError` if `bw lock` fails, in which case the token is kept
    #[instrument(skip(self))]
    pub async fn lock(&self) -> VaultResult<()> {
        let _gate = self.transition.lock().await;
        self.run(self.invocation(["lock"])).await?;
        self.set_token(None);
        info!("Vault locked");
        Ok(())
    }

    /// Logs in with the configured personal API key
    ///
    /// # Errors
    /// `ToolError` if login fails (already logged in, bad key, ...)
    #[instrument(skip(self))]
    pub async fn login_with_api_key(&self) -> VaultResult<()> {
        self.run(self.invocation(["login", "--apikey"])).await?;
        info!("Logged in with API key");
        Ok(())
    }

    /// Pulls the latest vault data from the server
    ///
    /// # Errors
    /// `NotUnlocked` without a session, `ToolError` on failure
    #[instrument(skip(self))]
    pub async fn sync(&self) -> VaultResult<()> {
        self.run(self.session_invocation(["sync"])?).await?;
        debug!("Vault synced");
        Ok(())
    }

    /// Lists all items
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError` or `ParseError`
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> VaultResult<Vec<VaultItem>> {
        self.run_json("items", self.session_invocation(["list", "items"])?)
            .await
    }

    /// Lists items matching the CLI's own search
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError` or `ParseError`
    #[instrument(skip(self))]
    pub async fn search_items(&self, query: &str) -> VaultResult<Vec<VaultItem>> {
        self.run_json(
            "items",
            self.session_invocation(["list", "items", "--search", query])?,
        )
        .await
    }

    /// Lists the items of one folder; `None` selects items without a folder
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError` or `ParseError`
    #[instrument(skip(self))]
    pub async fn list_items_in_folder(&self, folder_id: Option<&str>) -> VaultResult<Vec<VaultItem>> {
        let folder = folder_id.unwrap_or(NO_FOLDER);
        self.run_json(
            "items",
            self.session_invocation(["list", "items", "--folderid", folder])?,
        )
        .await
    }

    /// Lists items in the trash
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError` or `ParseError`
    #[instrument(skip(self))]
    pub async fn list_trash(&self) -> VaultResult<Vec<VaultItem>> {
        self.run_json(
            "items",
            self.session_invocation(["list", "items", "--trash"])?,
        )
        .await
    }

    /// Lists folders
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError` or `ParseError`
    #[instrument(skip(self))]
    pub async fn list_folders(&self) -> VaultResult<Vec<Folder>> {
        self.run_json("folders", self.session_invocation(["list", "folders"])?)
            .await
    }

    /// Fetches a single item
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError` (e.g. unknown id) or `ParseError`
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: &str) -> VaultResult<VaultItem> {
        self.run_json("item", self.session_invocation(["get", "item", id])?)
            .await
    }

    /// Fetches the current TOTP code of an item
    ///
    /// # Errors
    /// `NotUnlocked`, or `ToolError` when the tool fails or prints nothing
    #[instrument(skip(self))]
    pub async fn get_totp(&self, id: &str) -> VaultResult<String> {
        let output = self
            .run(self.session_invocation(["get", "totp", id])?)
            .await?;
        if output.stdout.is_empty() {
            return Err(VaultError::ToolError(format!("no TOTP code for item {id}")));
        }
        Ok(output.stdout)
    }

    /// Creates an item from its full JSON representation
    ///
    /// # Errors
    /// `NotUnlocked`, `Encode`, `ToolError`
    #[instrument(skip(self, item))]
    pub async fn create_item(&self, item: &Value) -> VaultResult<()> {
        let encoded = encode_payload(item)?;
        let invocation = self
            .session_invocation(["create", "item"])?
            .sensitive_arg(encoded.as_str());
        self.run(invocation).await?;
        info!("Vault item created");
        Ok(())
    }

    /// Applies `updates` to an existing item.
    ///
    /// The current item is read first, top-level keys from `updates` replace
    /// the current values and the merged object is written back. There is no
    /// revision check: a concurrent edit between the read and the write is
    /// overwritten.
    ///
    /// # Errors
    /// `NotUnlocked`, `ToolError`, `ParseError` or `Encode`
    #[instrument(skip(self, updates))]
    pub async fn edit_item(&self, id: &str, updates: &Map<String, Value>) -> VaultResult<()> {
        let current: Value = self
            .run_json("item", self.session_invocation(["get", "item", id])?)
            .await?;
        let merged = merge_fields(current, updates)?;
        let encoded = encode_payload(&merged)?;
        let invocation = self
            .session_invocation(["edit", "item", id])?
            .sensitive_arg(encoded.as_str());
        self.run(invocation).await?;
        info!("Vault item updated");
        Ok(())
    }

    /// Moves an item to the trash, or removes it for good
    ///
    /// # Errors
    /// `NotUnlocked` or `ToolError`
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &str, permanent: bool) -> VaultResult<()> {
        let mut args = vec!["delete", "item", id];
        if permanent {
            args.push("--permanent");
        }
        self.run(self.session_invocation(args)?).await?;
        info!("Vault item deleted");
        Ok(())
    }

    /// Restores an item from the trash
    ///
    /// # Errors
    /// `NotUnlocked` or `ToolError`
    #[instrument(skip(self))]
    pub async fn restore_item(&self, id: &str) -> VaultResult<()> {
        self.run(self.session_invocation(["restore", "item", id])?)
            .await?;
        info!("Vault item restored");
        Ok(())
    }

    /// Generates a random password
    ///
    /// # Errors
    /// `ToolError` on failure
    #[instrument(skip(self))]
    pub async fn generate_password(&self, options: &PasswordOptions) -> VaultResult<SecretString> {
        let output = self.run(self.invocation(options.to_args())).await?;
        Ok(SecretString::from(output.stdout))
    }

    /// Generates a passphrase
    ///
    /// # Errors
    /// `ToolError` on failure
    #[instrument(skip(self))]
    pub async fn generate_passphrase(
        &self,
        options: &PassphraseOptions,
    ) -> VaultResult<SecretString> {
        let output = self.run(self.invocation(options.to_args())).await?;
        Ok(SecretString::from(output.stdout))
    }
}

#[async_trait]
impl TotpSource for SessionStore {
    async fn current_code(&self, item_id: &str) -> VaultResult<String> {
        self.get_totp(item_id).await
    }
}

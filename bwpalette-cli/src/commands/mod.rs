//! Command handler modules for the CLI.

mod completions;
mod generate;
mod item;
mod list;
mod manpage;
mod session;
mod settings;
mod status;
mod totp;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::Context;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Status { format } => status::cmd_status(ctx, format),
        Commands::Unlock {
            password_env,
            export,
        } => session::cmd_unlock(ctx, password_env.as_deref(), export),
        Commands::Lock => session::cmd_lock(ctx),
        Commands::Sync => session::cmd_sync(ctx),
        Commands::LoginApikey {
            client_id,
            client_secret,
        } => session::cmd_login_apikey(ctx, client_id.as_deref(), client_secret.as_deref()),
        Commands::List {
            filter,
            search,
            format,
        } => list::cmd_list(ctx, filter.as_deref(), search.as_deref(), format),
        Commands::Folders { format } => list::cmd_folders(ctx, format),
        Commands::Get { id, field } => item::cmd_get(ctx, &id, field),
        Commands::Totp { search, watch } => totp::cmd_totp(ctx, search.as_deref(), watch),
        Commands::Create { json } => item::cmd_create(ctx, &json),
        Commands::Edit { id, json } => item::cmd_edit(ctx, &id, &json),
        Commands::Delete { id, permanent } => item::cmd_delete(ctx, &id, permanent),
        Commands::Restore { id } => item::cmd_restore(ctx, &id),
        Commands::Generate(subcmd) => generate::cmd_generate(ctx, subcmd),
        Commands::Config(subcmd) => settings::cmd_config(ctx, subcmd),
        Commands::Completions { shell } => completions::cmd_completions(shell),
        Commands::Manpage => manpage::cmd_manpage(),
    }
}

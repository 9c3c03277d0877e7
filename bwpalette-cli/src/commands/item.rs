//! Single item commands: get, create, edit, delete, restore.

use bwpalette_core::{ItemAction, VaultItem};
use serde_json::Value;

use crate::cli::FieldArg;
use crate::error::CliError;
use crate::util::{Context, block_on, read_json_arg};

/// Get command handler.
///
/// Prints the item as JSON, or just one field with `--field`.
pub fn cmd_get(ctx: &Context, id: &str, field: Option<FieldArg>) -> Result<(), CliError> {
    let store = ctx.store()?;

    if field == Some(FieldArg::Totp) {
        let code = block_on(async { Ok(store.get_totp(id).await?) })?;
        println!("{code}");
        return Ok(());
    }

    let item = block_on(async { Ok(store.get_item(id).await?) })?;
    match field {
        Some(field) => println!("{}", field_value(&item, field)?),
        None => {
            let json = serde_json::to_string_pretty(&item)
                .map_err(|e| CliError::Input(format!("Failed to serialize item: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn field_value(item: &VaultItem, field: FieldArg) -> Result<String, CliError> {
    let action = match field {
        FieldArg::Username => ItemAction::CopyUsername,
        FieldArg::Password => ItemAction::CopyPassword,
        FieldArg::Uri => ItemAction::CopyUrl,
        FieldArg::Notes => ItemAction::CopyNotes,
        FieldArg::Totp => ItemAction::CopyTotp,
    };
    action
        .value(item)
        .ok_or_else(|| CliError::Input(format!("item '{}' has no {field:?}", item.name)))
}

/// Create command handler
pub fn cmd_create(ctx: &Context, json: &str) -> Result<(), CliError> {
    let item = read_json_arg(json)?;
    if !item.is_object() {
        return Err(CliError::Input("item must be a JSON object".to_string()));
    }
    let store = ctx.store()?;
    block_on(async { Ok(store.create_item(&item).await?) })?;
    ctx.note("Item created.");
    Ok(())
}

/// Edit command handler
pub fn cmd_edit(ctx: &Context, id: &str, json: &str) -> Result<(), CliError> {
    let Value::Object(updates) = read_json_arg(json)? else {
        return Err(CliError::Input(
            "updates must be a JSON object of top-level fields".to_string(),
        ));
    };
    let store = ctx.store()?;
    block_on(async { Ok(store.edit_item(id, &updates).await?) })?;
    ctx.note(format!("Updated {} field(s) of item {id}.", updates.len()));
    Ok(())
}

/// Delete command handler
pub fn cmd_delete(ctx: &Context, id: &str, permanent: bool) -> Result<(), CliError> {
    let store = ctx.store()?;
    block_on(async { Ok(store.delete_item(id, permanent).await?) })?;
    if permanent {
        ctx.note(format!("Deleted item {id} permanently."));
    } else {
        ctx.note(format!("Moved item {id} to the trash."));
    }
    Ok(())
}

/// Restore command handler
pub fn cmd_restore(ctx: &Context, id: &str) -> Result<(), CliError> {
    let store = ctx.store()?;
    block_on(async { Ok(store.restore_item(id).await?) })?;
    ctx.note(format!("Restored item {id}."));
    Ok(())
}

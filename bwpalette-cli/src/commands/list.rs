//! List items and folders commands.

use std::sync::Arc;

use bwpalette_core::{DisplayItem, Folder, VaultItem, VaultView};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{Context, block_on, format_table, parse_filter};

/// List command handler.
///
/// Without `--filter` the configured default filter applies.
pub fn cmd_list(
    ctx: &Context,
    filter: Option<&str>,
    search: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let settings = ctx.settings()?;
    let filter = match filter {
        Some(id) => parse_filter(id)?,
        None => settings.default_filter(),
    };
    let view = VaultView::new(Arc::new(ctx.store_with(&settings)));

    block_on(async { Ok(view.apply_filter(filter).await?) })?;
    view.set_search(search.unwrap_or_default());

    match format {
        OutputFormat::Table => {
            println!("{}", format_items(&view.display_items(), &view.items()));
        }
        OutputFormat::Json => print_json(&view.items())?,
    }
    Ok(())
}

/// Folders command handler
pub fn cmd_folders(ctx: &Context, format: OutputFormat) -> Result<(), CliError> {
    let store = ctx.store()?;
    let folders = block_on(async { Ok(store.list_folders().await?) })?;

    match format {
        OutputFormat::Table => println!("{}", format_folders(&folders)),
        OutputFormat::Json => print_json(&folders)?,
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Input(format!("Failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Formats display rows as a table; `items` supplies the type column
#[must_use]
pub fn format_items(rows: &[DisplayItem], items: &[VaultItem]) -> String {
    if rows.iter().all(DisplayItem::is_placeholder) {
        return rows
            .first()
            .map_or_else(|| "No items found.".to_string(), |r| format!("{}.", r.title));
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let kind = items
                .iter()
                .find(|i| i.id == row.id)
                .map_or_else(String::new, |i| i.item_type.to_string());
            let tags: Vec<&str> = row.tags.iter().map(|t| t.text.as_str()).collect();
            vec![
                row.title.clone(),
                kind,
                row.subtitle.clone(),
                tags.join(","),
                row.id.clone(),
            ]
        })
        .collect();
    format_table(&["NAME", "TYPE", "DETAIL", "TAGS", "ID"], &table)
}

/// Formats folders as a table
#[must_use]
pub fn format_folders(folders: &[Folder]) -> String {
    if folders.is_empty() {
        return "No folders found.".to_string();
    }
    let table: Vec<Vec<String>> = folders
        .iter()
        .map(|f| vec![f.name.clone(), f.id.clone().unwrap_or_else(|| "-".to_string())])
        .collect();
    format_table(&["NAME", "ID"], &table)
}

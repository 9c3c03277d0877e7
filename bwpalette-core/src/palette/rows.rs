//! Turning vault items and TOTP entries into display rows

use serde::Serialize;

use super::{DisplayItem, Glyph, IconRef, ItemAction, Tag, actions_for, item_icon};
use crate::models::VaultItem;
use crate::totp::{OtpEntry, TotpRefreshScheduler};

const SEPARATOR: &str = " • ";

/// How close the countdown is to the end of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUrgency {
    /// More than 10 seconds left
    Normal,
    /// 6 to 10 seconds left
    Warning,
    /// 5 seconds or less
    Critical,
}

impl TimeUrgency {
    /// Urgency for the given remaining seconds
    #[must_use]
    pub const fn from_remaining(seconds: u32) -> Self {
        match seconds {
            0..=5 => Self::Critical,
            6..=10 => Self::Warning,
            _ => Self::Normal,
        }
    }
}

/// Groups a six digit code as `123 456`; other codes are returned unchanged
#[must_use]
pub fn format_code(code: &str) -> String {
    let code = code.trim();
    if code.chars().count() == 6 && code.is_ascii() {
        format!("{} {}", &code[..3], &code[3..])
    } else {
        code.to_string()
    }
}

/// Countdown text, e.g. `25s`
#[must_use]
pub fn time_indicator(remaining: u32) -> String {
    format!("{remaining}s")
}

fn time_tag(remaining: u32) -> Tag {
    Tag {
        text: time_indicator(remaining),
        urgency: Some(TimeUrgency::from_remaining(remaining)),
    }
}

/// Row for a vault item
#[must_use]
pub fn vault_display_item(item: &VaultItem) -> DisplayItem {
    let mut tags = Vec::new();
    if item.favorite {
        tags.push(Tag::new("Favorite"));
    }
    if item.has_totp() {
        tags.push(Tag::new("TOTP"));
    }
    DisplayItem {
        id: item.id.clone(),
        title: item.name.clone(),
        subtitle: item.subtitle(),
        icon: item_icon(item),
        tags,
        actions: actions_for(item),
    }
}

fn otp_row(entry: &OtpEntry, icon: IconRef, remaining: u32) -> DisplayItem {
    let code = entry
        .current_code
        .as_deref()
        .map_or_else(|| "Loading...".to_string(), format_code);
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if let Some(user) = entry.secondary_label.as_deref().filter(|u| !u.is_empty()) {
        parts.push(user.to_string());
    }
    parts.push(code);
    parts.push(time_indicator(remaining));

    DisplayItem {
        id: entry.item_id.clone(),
        title: entry.label.clone(),
        subtitle: parts.join(SEPARATOR),
        icon,
        tags: vec![time_tag(remaining)],
        actions: vec![ItemAction::CopyTotp],
    }
}

/// Rows for the TOTP list.
///
/// `items` is only consulted for icons. Placeholder rows stand in for the
/// loading, empty and no-match states.
#[must_use]
pub fn totp_display_items(
    scheduler: &TotpRefreshScheduler,
    items: &[VaultItem],
    query: &str,
) -> Vec<DisplayItem> {
    let entries = scheduler.snapshot();
    if scheduler.is_loading() && entries.iter().all(|e| e.current_code.is_none()) {
        return vec![DisplayItem::placeholder(
            "Loading TOTP codes...",
            "Fetching codes from the vault",
            Glyph::Loading,
        )];
    }
    if entries.is_empty() {
        return vec![DisplayItem::placeholder(
            "No TOTP items",
            "No login in the vault has a TOTP secret",
            Glyph::Empty,
        )];
    }

    let query = query.trim().to_lowercase();
    let remaining = scheduler.remaining();
    let rows: Vec<DisplayItem> = entries
        .iter()
        .filter(|e| {
            query.is_empty()
                || e.label.to_lowercase().contains(&query)
                || e
                    .secondary_label
                    .as_deref()
                    .is_some_and(|u| u.to_lowercase().contains(&query))
        })
        .map(|e| {
            let icon = items
                .iter()
                .find(|i| i.id == e.item_id)
                .map_or(IconRef::Glyph(Glyph::Web), item_icon);
            otp_row(e, icon, remaining)
        })
        .collect();

    if rows.is_empty() {
        vec![DisplayItem::placeholder(
            "No matching TOTP items",
            "Try a different search",
            Glyph::Search,
        )]
    } else {
        rows
    }
}

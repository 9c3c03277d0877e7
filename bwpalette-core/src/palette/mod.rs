//! Presentation model for palette-style hosts
//!
//! Hosts pull [`DisplayItem`]s (from [`VaultView`] or [`totp_display_items`])
//! and redraw when they receive a [`ViewEvent`] or a
//! [`crate::totp::TotpEvent`]. Nothing here renders anything.

mod actions;
mod filter;
mod icon;
mod rows;
mod view;

use serde::Serialize;

pub use actions::{ItemAction, actions_for};
pub use filter::{VaultFilter, matches_search};
pub use icon::{Glyph, ICON_SERVICE_URL, IconRef, item_icon, registrable_domain};
pub use rows::{TimeUrgency, format_code, time_indicator, totp_display_items, vault_display_item};
pub use view::{VaultView, ViewEvent};

/// Short label shown next to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Label text
    pub text: String,
    /// Countdown urgency, for time tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<TimeUrgency>,
}

impl Tag {
    /// Creates a plain tag
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            urgency: None,
        }
    }
}

/// One row of a palette list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    /// Vault item id; empty for placeholder rows
    pub id: String,
    /// Primary text
    pub title: String,
    /// Secondary text
    pub subtitle: String,
    /// Icon
    pub icon: IconRef,
    /// Tags
    pub tags: Vec<Tag>,
    /// Actions, the first one is the default
    pub actions: Vec<ItemAction>,
}

impl DisplayItem {
    /// Informational row without an item or actions
    #[must_use]
    pub fn placeholder(title: impl Into<String>, subtitle: impl Into<String>, glyph: Glyph) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            subtitle: subtitle.into(),
            icon: IconRef::Glyph(glyph),
            tags: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Returns true for placeholder rows
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }

    /// The action taken on activation
    #[must_use]
    pub fn default_action(&self) -> Option<ItemAction> {
        self.actions.first().copied()
    }
}

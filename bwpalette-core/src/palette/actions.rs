//! Per-item actions

use serde::Serialize;

use crate::models::{ItemType, VaultItem};

/// Something the user can do with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction {
    /// Copy the login password
    CopyPassword,
    /// Copy the login username
    CopyUsername,
    /// Copy the primary URI
    CopyUrl,
    /// Open the primary URI in a browser
    OpenUrl,
    /// Fetch and copy the current TOTP code
    CopyTotp,
    /// Copy the card number
    CopyCardNumber,
    /// Copy the card security code
    CopySecurityCode,
    /// Copy the notes
    CopyNotes,
    /// Edit the item
    Edit,
    /// Move the item to the trash
    Delete,
    /// Restore the item from the trash
    Restore,
    /// Remove the item for good
    DeletePermanently,
}

impl ItemAction {
    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CopyPassword => "Copy password",
            Self::CopyUsername => "Copy username",
            Self::CopyUrl => "Copy URL",
            Self::OpenUrl => "Open URL",
            Self::CopyTotp => "Copy TOTP code",
            Self::CopyCardNumber => "Copy card number",
            Self::CopySecurityCode => "Copy security code",
            Self::CopyNotes => "Copy notes",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::Restore => "Restore",
            Self::DeletePermanently => "Delete permanently",
        }
    }

    /// Value this action copies or opens, if it can be read from the item.
    ///
    /// `CopyTotp` always returns `None`: the code has to be fetched.
    #[must_use]
    pub fn value(self, item: &VaultItem) -> Option<String> {
        let login = item.login.as_ref();
        let card = item.card.as_ref();
        let value = match self {
            Self::CopyPassword => login.and_then(|l| l.password.clone()),
            Self::CopyUsername => item
                .username()
                .or_else(|| item.identity.as_ref().and_then(|i| i.username.as_deref()))
                .map(str::to_string),
            Self::CopyUrl | Self::OpenUrl => {
                login.and_then(|l| l.primary_uri()).map(str::to_string)
            }
            Self::CopyCardNumber => card.and_then(|c| c.number.clone()),
            Self::CopySecurityCode => card.and_then(|c| c.code.clone()),
            Self::CopyNotes => item.notes.clone(),
            Self::CopyTotp
            | Self::Edit
            | Self::Delete
            | Self::Restore
            | Self::DeletePermanently => None,
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Actions available for an item, default action first
#[must_use]
pub fn actions_for(item: &VaultItem) -> Vec<ItemAction> {
    if item.is_deleted() {
        return vec![ItemAction::Restore, ItemAction::DeletePermanently];
    }

    let mut actions = Vec::new();
    let offer = |actions: &mut Vec<ItemAction>, action: ItemAction| {
        if action.value(item).is_some() {
            actions.push(action);
        }
    };

    match item.item_type {
        ItemType::Login => {
            offer(&mut actions, ItemAction::CopyPassword);
            offer(&mut actions, ItemAction::CopyUsername);
            if item.has_totp() {
                actions.push(ItemAction::CopyTotp);
            }
            offer(&mut actions, ItemAction::CopyUrl);
            offer(&mut actions, ItemAction::OpenUrl);
        }
        ItemType::Card => {
            offer(&mut actions, ItemAction::CopyCardNumber);
            offer(&mut actions, ItemAction::CopySecurityCode);
        }
        ItemType::Identity => offer(&mut actions, ItemAction::CopyUsername),
        ItemType::SecureNote | ItemType::Other(_) => {}
    }
    offer(&mut actions, ItemAction::CopyNotes);

    actions.push(ItemAction::Edit);
    actions.push(ItemAction::Delete);
    actions
}

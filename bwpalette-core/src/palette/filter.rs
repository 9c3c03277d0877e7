//! Vault filters and search

use std::fmt;

use crate::models::{Folder, ItemType, VaultItem};

const FOLDER_PREFIX: &str = "folder_";
const NO_FOLDER_ID: &str = "folder_none";

/// Which part of the vault to show
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum VaultFilter {
    /// Every item outside the trash
    #[default]
    All,
    /// Favorites only
    Favorites,
    /// Login items
    Logins,
    /// Payment cards
    Cards,
    /// Identities
    Identities,
    /// Secure notes
    Notes,
    /// Items in the trash
    Trash,
    /// Items without a folder
    NoFolder,
    /// Items in one folder
    Folder(String),
}

impl VaultFilter {
    /// Parses a filter id; unknown ids select [`VaultFilter::All`]
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        match id.trim() {
            "favorites" => Self::Favorites,
            "logins" => Self::Logins,
            "cards" => Self::Cards,
            "identities" => Self::Identities,
            "notes" => Self::Notes,
            "trash" => Self::Trash,
            NO_FOLDER_ID => Self::NoFolder,
            other => match other.strip_prefix(FOLDER_PREFIX) {
                Some(folder) if !folder.is_empty() => Self::Folder(folder.to_string()),
                _ => Self::All,
            },
        }
    }

    /// Stable filter id
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Favorites => "favorites".to_string(),
            Self::Logins => "logins".to_string(),
            Self::Cards => "cards".to_string(),
            Self::Identities => "identities".to_string(),
            Self::Notes => "notes".to_string(),
            Self::Trash => "trash".to_string(),
            Self::NoFolder => NO_FOLDER_ID.to_string(),
            Self::Folder(id) => format!("{FOLDER_PREFIX}{id}"),
        }
    }

    /// Item type selected by this filter, if any
    #[must_use]
    pub const fn item_type(&self) -> Option<ItemType> {
        match self {
            Self::Logins => Some(ItemType::Login),
            Self::Cards => Some(ItemType::Card),
            Self::Identities => Some(ItemType::Identity),
            Self::Notes => Some(ItemType::SecureNote),
            _ => None,
        }
    }

    /// Returns true if `item` belongs in this view
    #[must_use]
    pub fn matches(&self, item: &VaultItem) -> bool {
        if matches!(self, Self::Trash) {
            return item.is_deleted();
        }
        if item.is_deleted() {
            return false;
        }
        match self {
            Self::All | Self::Trash => true,
            Self::Favorites => item.favorite,
            Self::NoFolder => item.folder_id.is_none(),
            Self::Folder(id) => item.folder_id.as_deref() == Some(id.as_str()),
            Self::Logins | Self::Cards | Self::Identities | Self::Notes => {
                self.item_type() == Some(item.item_type)
            }
        }
    }

    /// Display name, resolving folder ids against `folders`
    #[must_use]
    pub fn label(&self, folders: &[Folder]) -> String {
        match self {
            Self::Folder(id) => folders
                .iter()
                .find(|f| f.id.as_deref() == Some(id.as_str()))
                .map_or_else(|| format!("Folder {id}"), |f| format!("Folder: {}", f.name)),
            other => other.to_string(),
        }
    }

    /// Every selectable filter; folder entries only when folders exist
    #[must_use]
    pub fn options(folders: &[Folder]) -> Vec<Self> {
        let mut options = vec![
            Self::All,
            Self::Favorites,
            Self::Logins,
            Self::Cards,
            Self::Identities,
            Self::Notes,
            Self::Trash,
        ];
        if !folders.is_empty() {
            options.push(Self::NoFolder);
            options.extend(
                folders
                    .iter()
                    .filter_map(|f| f.id.clone())
                    .map(Self::Folder),
            );
        }
        options
    }
}

impl fmt::Display for VaultFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All items"),
            Self::Favorites => write!(f, "Favorites"),
            Self::Logins => write!(f, "Logins"),
            Self::Cards => write!(f, "Cards"),
            Self::Identities => write!(f, "Identities"),
            Self::Notes => write!(f, "Secure notes"),
            Self::Trash => write!(f, "Trash"),
            Self::NoFolder => write!(f, "No folder"),
            Self::Folder(id) => write!(f, "Folder {id}"),
        }
    }
}

/// Case-insensitive match of `query` against name, username and URI.
///
/// A blank query matches everything.
#[must_use]
pub fn matches_search(item: &VaultItem, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let uri = item.login.as_ref().and_then(|l| l.primary_uri());
    [Some(item.name.as_str()), item.username(), uri]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}

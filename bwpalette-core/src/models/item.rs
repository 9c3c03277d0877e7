//! Vault item and folder models (`bw list items`, `bw list folders`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::CustomField;
use super::null_as_default;

/// Vault item type, serialized as the CLI's integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ItemType {
    /// Website login
    #[default]
    Login,
    /// Free-form secure note
    SecureNote,
    /// Payment card
    Card,
    /// Personal identity
    Identity,
    /// Type code this client does not know (e.g. newer item kinds)
    Other(u8),
}

impl From<u8> for ItemType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Login,
            2 => Self::SecureNote,
            3 => Self::Card,
            4 => Self::Identity,
            other => Self::Other(other),
        }
    }
}

impl From<ItemType> for u8 {
    fn from(kind: ItemType) -> Self {
        match kind {
            ItemType::Login => 1,
            ItemType::SecureNote => 2,
            ItemType::Card => 3,
            ItemType::Identity => 4,
            ItemType::Other(code) => code,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::SecureNote => write!(f, "note"),
            Self::Card => write!(f, "card"),
            Self::Identity => write!(f, "identity"),
            Self::Other(code) => write!(f, "type {code}"),
        }
    }
}

/// URI attached to a login
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginUri {
    /// Match detection strategy code
    #[serde(default, rename = "match")]
    pub match_type: Option<u8>,
    /// The URI
    #[serde(default)]
    pub uri: Option<String>,
}

/// Login credentials
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    /// Associated URIs
    #[serde(default, deserialize_with = "null_as_default")]
    pub uris: Vec<LoginUri>,
    /// Username
    #[serde(default)]
    pub username: Option<String>,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
    /// TOTP secret or `otpauth://` URI
    #[serde(default)]
    pub totp: Option<String>,
    /// When the password last changed
    #[serde(default)]
    pub password_revision_date: Option<DateTime<Utc>>,
}

impl Login {
    /// First URI with a non-empty value
    #[must_use]
    pub fn primary_uri(&self) -> Option<&str> {
        self.uris
            .iter()
            .filter_map(|u| u.uri.as_deref())
            .map(str::trim)
            .find(|u| !u.is_empty())
    }

    /// Returns true if a TOTP secret is configured
    #[must_use]
    pub fn has_totp(&self) -> bool {
        self.totp.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Payment card
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Name on the card
    #[serde(default)]
    pub cardholder_name: Option<String>,
    /// Brand (Visa, Mastercard, ...)
    #[serde(default)]
    pub brand: Option<String>,
    /// Card number
    #[serde(default)]
    pub number: Option<String>,
    /// Expiry month
    #[serde(default)]
    pub exp_month: Option<String>,
    /// Expiry year
    #[serde(default)]
    pub exp_year: Option<String>,
    /// Security code
    #[serde(default)]
    pub code: Option<String>,
}

impl Card {
    /// Last four digits of the number, if long enough
    #[must_use]
    pub fn last_four(&self) -> Option<&str> {
        let number = self.number.as_deref()?.trim();
        (number.len() >= 4 && number.is_char_boundary(number.len() - 4))
            .then(|| &number[number.len() - 4..])
    }
}

/// Personal identity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Title (Mr, Ms, ...)
    #[serde(default)]
    pub title: Option<String>,
    /// First name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Middle name
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Company
    #[serde(default)]
    pub company: Option<String>,
    /// Username
    #[serde(default)]
    pub username: Option<String>,
}

impl Identity {
    /// First and last name joined by a space
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Secure note marker
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecureNote {
    /// Note kind code
    #[serde(default, rename = "type")]
    pub note_type: Option<u8>,
}

/// A vault item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultItem {
    /// Item id (stable across syncs)
    pub id: String,
    /// Owning organization
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Folder, `None` for items without one
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Item type
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    /// Master password re-prompt code
    #[serde(default, deserialize_with = "null_as_default")]
    pub reprompt: u8,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Favorite flag
    #[serde(default, deserialize_with = "null_as_default")]
    pub favorite: bool,
    /// Login data for login items
    #[serde(default)]
    pub login: Option<Login>,
    /// Card data for card items
    #[serde(default)]
    pub card: Option<Card>,
    /// Identity data for identity items
    #[serde(default)]
    pub identity: Option<Identity>,
    /// Secure note data for note items
    #[serde(default)]
    pub secure_note: Option<SecureNote>,
    /// Custom fields
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<CustomField>,
    /// Collections the item belongs to
    #[serde(default, deserialize_with = "null_as_default")]
    pub collection_ids: Vec<String>,
    /// Last modification
    #[serde(default)]
    pub revision_date: Option<DateTime<Utc>>,
    /// Creation time
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    /// Set when the item is in the trash
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
}

impl VaultItem {
    /// Returns true for login items with a configured TOTP secret
    #[must_use]
    pub fn has_totp(&self) -> bool {
        self.item_type == ItemType::Login && self.login.as_ref().is_some_and(Login::has_totp)
    }

    /// Username of a login item
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.login
            .as_ref()
            .and_then(|l| l.username.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// Returns true if the item is in the trash
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }

    /// Secondary display text, by item type
    #[must_use]
    pub fn subtitle(&self) -> String {
        match self.item_type {
            ItemType::Login => self.username().unwrap_or_default().to_string(),
            ItemType::Card => self
                .card
                .as_ref()
                .and_then(|c| c.brand.clone())
                .unwrap_or_default(),
            ItemType::Identity => self
                .identity
                .as_ref()
                .and_then(|i| i.first_name.clone())
                .unwrap_or_default(),
            ItemType::SecureNote => "Secure Note".to_string(),
            ItemType::Other(_) => String::new(),
        }
    }
}

/// A vault folder
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Folder {
    /// Folder id; the synthetic "No Folder" entry has none
    #[serde(default)]
    pub id: Option<String>,
    /// Folder name
    #[serde(default)]
    pub name: String,
}

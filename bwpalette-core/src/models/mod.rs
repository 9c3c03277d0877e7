//! Data models parsed from the Bitwarden CLI
//!
//! All JSON models ignore unknown fields so newer CLI releases keep parsing.

mod field;
mod generator;
mod item;
mod status;

use serde::{Deserialize, Deserializer};

pub use field::{CustomField, FieldType};
pub use generator::{PassphraseOptions, PasswordOptions};
pub use item::{Card, Folder, Identity, ItemType, Login, LoginUri, SecureNote, VaultItem};
pub use status::{VaultState, VaultStatus};

/// Treats an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

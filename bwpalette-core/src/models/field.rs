//! Custom fields attached to vault items.

use serde::{Deserialize, Serialize};

/// Custom field type, serialized as the CLI's integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum FieldType {
    /// Plain text field
    #[default]
    Text,
    /// Hidden field (masked display)
    Hidden,
    /// Checkbox
    Boolean,
    /// Linked to another item property
    Linked,
    /// Type code this client does not know
    Other(u8),
}

impl From<u8> for FieldType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Text,
            1 => Self::Hidden,
            2 => Self::Boolean,
            3 => Self::Linked,
            other => Self::Other(other),
        }
    }
}

impl From<FieldType> for u8 {
    fn from(kind: FieldType) -> Self {
        match kind {
            FieldType::Text => 0,
            FieldType::Hidden => 1,
            FieldType::Boolean => 2,
            FieldType::Linked => 3,
            FieldType::Other(code) => code,
        }
    }
}

/// A custom field on a vault item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomField {
    /// Field name
    #[serde(default)]
    pub name: Option<String>,
    /// Field value
    #[serde(default)]
    pub value: Option<String>,
    /// Type of the field
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
}

impl CustomField {
    /// Creates a new text field
    #[must_use]
    pub fn new_text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            field_type: FieldType::Text,
        }
    }

    /// Creates a new hidden field
    #[must_use]
    pub fn new_hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            field_type: FieldType::Hidden,
        }
    }

    /// Returns true if the value should be masked when displayed
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        matches!(self.field_type, FieldType::Hidden)
    }

    /// Returns the display value, masking hidden fields
    #[must_use]
    pub fn display_value(&self) -> String {
        match (&self.value, self.is_hidden()) {
            (None, _) => String::new(),
            (Some(_), true) => "••••••••".to_string(),
            (Some(v), false) => v.clone(),
        }
    }
}

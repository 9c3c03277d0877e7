//! `bw status` model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lock state reported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultState {
    /// Not logged in
    #[default]
    Unauthenticated,
    /// Logged in, vault locked
    Locked,
    /// Logged in and unlocked
    Unlocked,
}

impl VaultState {
    /// Parses the CLI's status string, case-insensitively.
    ///
    /// Unrecognized values are treated as unauthenticated.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "unlocked" => Self::Unlocked,
            "locked" => Self::Locked,
            _ => Self::Unauthenticated,
        }
    }
}

impl std::fmt::Display for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    server_url: Option<String>,
    #[serde(default)]
    last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    user_email: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Vault status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawStatus", rename_all = "camelCase")]
pub struct VaultStatus {
    /// Lock state
    #[serde(rename = "status")]
    pub state: VaultState,
    /// Logged-in account
    pub user_email: Option<String>,
    /// Last successful sync
    pub last_sync: Option<DateTime<Utc>>,
    /// Server the CLI talks to
    pub server_url: Option<String>,
    /// Account id
    pub user_id: Option<String>,
}

impl From<RawStatus> for VaultStatus {
    fn from(raw: RawStatus) -> Self {
        Self {
            state: raw
                .status
                .as_deref()
                .map_or(VaultState::Unauthenticated, VaultState::from_status),
            user_email: raw.user_email,
            last_sync: raw.last_sync,
            server_url: raw.server_url,
            user_id: raw.user_id,
        }
    }
}

impl VaultStatus {
    /// Returns true if the vault is unlocked
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.state == VaultState::Unlocked
    }

    /// Returns true if logged in but locked
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state == VaultState::Locked
    }

    /// Returns true if not logged in
    #[must_use]
    pub fn is_logged_out(&self) -> bool {
        self.state == VaultState::Unauthenticated
    }
}

//! TOTP countdown and code refresh
//!
//! [`TotpRefreshScheduler`] keeps the current one-time codes of a set of
//! login items fresh: it fetches them once on start, ticks every second to
//! track the 30 second window and refetches at each window boundary. Codes
//! come from a [`TotpSource`] (the session store in production). Nothing in
//! this module draws anything; hosts subscribe to [`TotpEvent`]s.

mod cancel;
mod clock;
mod scheduler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VaultResult;

pub use cancel::CancellationToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{SchedulerPhase, TotpRefreshScheduler};

/// Length of a TOTP window in seconds
pub const TOTP_PERIOD_SECS: u32 = 30;

/// Maximum number of code fetches in flight at once
pub const MAX_CONCURRENT_FETCHES: usize = 3;

/// Seconds left in the current window for the given unix time.
///
/// Always in `1..=30`; it reads 30 right after a boundary and counts down.
#[must_use]
pub fn remaining_seconds(unix_seconds: i64) -> u32 {
    let period = i64::from(TOTP_PERIOD_SECS);
    u32::try_from(period - unix_seconds.rem_euclid(period)).unwrap_or(TOTP_PERIOD_SECS)
}

/// Index of the window containing `unix_seconds`; changes exactly at each
/// boundary
#[must_use]
pub fn window_index(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(i64::from(TOTP_PERIOD_SECS))
}

/// Produces the current code for an item
#[async_trait]
pub trait TotpSource: Send + Sync {
    /// Returns the code, or an error when none is available right now
    ///
    /// # Errors
    /// Any vault error; the scheduler treats every error as "no code"
    async fn current_code(&self, item_id: &str) -> VaultResult<String>;
}

/// A login item tracked by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpEntry {
    /// Vault item id
    pub item_id: String,
    /// Item name
    pub label: String,
    /// Username, if any
    pub secondary_label: Option<String>,
    /// Most recently fetched code; `None` until the first successful fetch
    pub current_code: Option<String>,
}

/// Notifications emitted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TotpEvent {
    /// The initial fetch round finished (successfully or not)
    Loaded,
    /// The countdown moved
    RemainingChanged {
        /// Seconds left in the window
        remaining: u32,
    },
    /// An entry received a new code
    CodeUpdated {
        /// Item whose code changed
        item_id: String,
    },
    /// The scheduler was disposed; no further events follow
    Disposed,
}

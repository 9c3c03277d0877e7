//! Background refresh of TOTP codes

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures::StreamExt;
use futures::future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use super::{
    CancellationToken, Clock, MAX_CONCURRENT_FETCHES, OtpEntry, SystemClock, TotpEvent,
    TotpSource, remaining_seconds, window_index,
};
use crate::error::VaultResult;
use crate::models::VaultItem;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

const EVENT_CAPACITY: usize = 64;

/// `last_remaining` before the first tick, `last_window` before loading
const NOT_OBSERVED: i64 = -1;

/// Lifecycle of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerPhase {
    /// Created, not started
    #[default]
    Idle,
    /// Initial fetch round in progress
    Loading,
    /// Codes loaded, waiting for the next window
    Ready,
    /// Refetching at a window boundary
    Refreshing,
    /// Stopped for good
    Disposed,
}

struct Shared {
    source: Arc<dyn TotpSource>,
    clock: Arc<dyn Clock>,
    entries: RwLock<Vec<OtpEntry>>,
    phase: Mutex<SchedulerPhase>,
    /// Set while any fetch round (initial or refresh) runs
    fetching: AtomicBool,
    last_remaining: AtomicI64,
    /// Window the current codes belong to
    last_window: AtomicI64,
    cancel: CancellationToken,
    events: Mutex<Option<broadcast::Sender<TotpEvent>>>,
}

impl Shared {
    fn emit(&self, event: TotpEvent) {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = events.as_ref() {
            // Err only means nobody is listening
            let _ = tx.send(event);
        }
    }

    fn phase(&self) -> SchedulerPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, next: SchedulerPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != SchedulerPhase::Disposed {
            *phase = next;
        }
    }

    fn item_ids(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.item_id.clone())
            .collect()
    }

    /// Moves `Idle` to `Loading`; false if there is nothing to load
    fn begin_load(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != SchedulerPhase::Idle {
            return false;
        }
        let empty = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty();
        if empty {
            *phase = SchedulerPhase::Ready;
            drop(phase);
            self.emit(TotpEvent::Loaded);
            return false;
        }
        *phase = SchedulerPhase::Loading;
        self.fetching.store(true, Ordering::SeqCst);
        self.last_window
            .store(window_index(self.clock.now_unix()), Ordering::SeqCst);
        true
    }

    fn finish_load(&self) {
        self.fetching.store(false, Ordering::SeqCst);
        if !self.cancel.is_cancelled() {
            self.set_phase(SchedulerPhase::Ready);
            self.emit(TotpEvent::Loaded);
            debug!("Initial TOTP codes loaded");
        }
    }

    /// Fetches every entry's code with bounded concurrency
    async fn fetch_all(self: &Arc<Self>) {
        let cancel = self.cancel.clone();
        futures::stream::iter(self.item_ids())
            .take_while(move |_| future::ready(!cancel.is_cancelled()))
            .map(|item_id| {
                let shared = Arc::clone(self);
                async move {
                    let result = shared.source.current_code(&item_id).await;
                    (item_id, result)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .for_each(|(item_id, result)| {
                self.apply(&item_id, result);
                future::ready(())
            })
            .await;
    }

    fn apply(&self, item_id: &str, result: VaultResult<String>) {
        let code = match result {
            Ok(code) if !code.trim().is_empty() => code.trim().to_string(),
            Ok(_) => {
                debug!(item_id, "Empty TOTP code, keeping previous value");
                return;
            }
            Err(e) => {
                warn!(item_id, "Failed to fetch TOTP code: {e}");
                return;
            }
        };

        {
            // Checked under the lock so dispose cannot clear in between
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if self.cancel.is_cancelled() {
                trace!(item_id, "Discarding TOTP code fetched after dispose");
                return;
            }
            for entry in entries.iter_mut().filter(|e| e.item_id == item_id) {
                entry.current_code = Some(code.clone());
            }
        }
        self.emit(TotpEvent::CodeUpdated {
            item_id: item_id.to_string(),
        });
    }

    fn tick(self: &Arc<Self>) -> bool {
        if self.cancel.is_cancelled() || self.phase() == SchedulerPhase::Idle {
            return false;
        }

        let now = self.clock.now_unix();
        let remaining = remaining_seconds(now);
        let previous = self
            .last_remaining
            .swap(i64::from(remaining), Ordering::SeqCst);
        if previous != i64::from(remaining) {
            self.emit(TotpEvent::RemainingChanged { remaining });
        }

        // Compared by window so a tick that misses the boundary second, or
        // a clock jump, still refreshes
        let window = window_index(now);
        let previous_window = self.last_window.swap(window, Ordering::SeqCst);
        if previous_window == NOT_OBSERVED || previous_window == window {
            return false;
        }
        if self
            .fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("TOTP fetch still in flight, skipping refresh");
            return false;
        }

        self.set_phase(SchedulerPhase::Refreshing);
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            shared.fetch_all().await;
            shared.fetching.store(false, Ordering::SeqCst);
            shared.set_phase(SchedulerPhase::Ready);
        });
        true
    }
}

async fn run_ticker(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    while !shared.cancel.is_cancelled() {
        interval.tick().await;
        shared.tick();
    }
}

/// Keeps TOTP codes of login items current
///
/// Must be started from within a Tokio runtime. Dropping the scheduler
/// disposes it.
pub struct TotpRefreshScheduler {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for TotpRefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpRefreshScheduler")
            .field("phase", &self.phase())
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl TotpRefreshScheduler {
    /// Creates a scheduler for the login items among `items` that have a
    /// TOTP secret, ordered by name
    #[must_use]
    pub fn new(source: Arc<dyn TotpSource>, items: &[VaultItem]) -> Self {
        Self::with_clock(source, items, Arc::new(SystemClock))
    }

    /// Like [`Self::new`] with a custom clock
    #[must_use]
    pub fn with_clock(
        source: Arc<dyn TotpSource>,
        items: &[VaultItem],
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut entries: Vec<OtpEntry> = items
            .iter()
            .filter(|item| item.has_totp())
            .map(|item| OtpEntry {
                item_id: item.id.clone(),
                label: item.name.clone(),
                secondary_label: item.username().map(str::to_string),
                current_code: None,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.label.cmp(&b.label))
        });

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                source,
                clock,
                entries: RwLock::new(entries),
                phase: Mutex::new(SchedulerPhase::Idle),
                fetching: AtomicBool::new(false),
                last_remaining: AtomicI64::new(NOT_OBSERVED),
                last_window: AtomicI64::new(NOT_OBSERVED),
                cancel: CancellationToken::new(),
                events: Mutex::new(Some(events)),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Starts the initial fetch round and the one second ticker.
    ///
    /// Only the first call on an idle scheduler has an effect. A scheduler
    /// without entries becomes ready immediately and never ticks.
    pub fn start(&self) {
        if !self.shared.begin_load() {
            return;
        }
        let loader = {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                shared.fetch_all().await;
                shared.finish_load();
            })
        };
        let ticker = tokio::spawn(run_ticker(Arc::clone(&self.shared)));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([loader, ticker]);
        debug!(entries = self.len(), "TOTP scheduler started");
    }

    /// Runs the initial fetch round in the caller's task, without a ticker.
    ///
    /// Pair with [`Self::tick`] to drive the scheduler by hand.
    pub async fn load(&self) {
        if self.shared.begin_load() {
            self.shared.fetch_all().await;
            self.shared.finish_load();
        }
    }

    /// Processes one countdown step against the clock.
    ///
    /// Returns true if a refresh round was started, which happens on the
    /// first tick in a later window than the one the codes were fetched in.
    /// Does nothing before [`Self::start`] or [`Self::load`]. The ticker
    /// calls this every second.
    pub fn tick(&self) -> bool {
        self.shared.tick()
    }

    /// Stops ticking, closes the event stream and forgets all codes.
    ///
    /// Safe to call any number of times. Codes arriving afterwards are
    /// dropped.
    pub fn dispose(&self) {
        if !self.shared.cancel.cancel() {
            return;
        }
        for task in self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            task.abort();
        }
        for entry in self
            .shared
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .iter_mut()
        {
            entry.current_code = None;
        }
        *self.shared.phase.lock().unwrap_or_else(PoisonError::into_inner) =
            SchedulerPhase::Disposed;
        self.shared.emit(TotpEvent::Disposed);
        self.shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("TOTP scheduler disposed");
    }

    /// Subscribes to scheduler events.
    ///
    /// After dispose the returned receiver is already closed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TotpEvent> {
        let events = self
            .shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match events.as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Copy of all entries in display order
    #[must_use]
    pub fn snapshot(&self) -> Vec<OtpEntry> {
        self.shared
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entry for one item
    #[must_use]
    pub fn entry(&self, item_id: &str) -> Option<OtpEntry> {
        self.shared
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.item_id == item_id)
            .cloned()
    }

    /// Number of tracked entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no item has a TOTP secret
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.shared.phase()
    }

    /// Returns true while the initial load has not completed
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == SchedulerPhase::Loading
    }

    /// Returns true while a fetch round is in flight
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.shared.fetching.load(Ordering::SeqCst)
    }

    /// Seconds left in the current window, read from the clock
    #[must_use]
    pub fn remaining(&self) -> u32 {
        remaining_seconds(self.shared.clock.now_unix())
    }

    /// Countdown value seen by the last tick
    #[must_use]
    pub fn last_remaining(&self) -> Option<u32> {
        u32::try_from(self.shared.last_remaining.load(Ordering::SeqCst)).ok()
    }
}

impl Drop for TotpRefreshScheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}

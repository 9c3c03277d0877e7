//! Cached, filtered view of the vault

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use super::{DisplayItem, Glyph, VaultFilter, matches_search, vault_display_item};
use crate::error::VaultResult;
use crate::models::{Folder, VaultItem};
use crate::session::SessionStore;

const EVENT_CAPACITY: usize = 16;

/// Change notification for hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// `display_items()` would now return something different
    ItemsChanged,
}

#[derive(Default)]
struct ViewState {
    items: Vec<VaultItem>,
    folders: Vec<Folder>,
    filter: VaultFilter,
    search: String,
}

/// Items and folders loaded through a [`SessionStore`], narrowed by the
/// current filter and search text
pub struct VaultView {
    store: Arc<SessionStore>,
    state: RwLock<ViewState>,
    events: broadcast::Sender<ViewEvent>,
}

impl std::fmt::Debug for VaultView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("VaultView")
            .field("items", &state.items.len())
            .field("filter", &state.filter)
            .finish_non_exhaustive()
    }
}

impl VaultView {
    /// Creates an empty view; call [`Self::refresh`] to load
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            state: RwLock::new(ViewState::default()),
            events,
        }
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Subscribes to change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    fn notify(&self) {
        // No subscribers is fine
        let _ = self.events.send(ViewEvent::ItemsChanged);
    }

    /// Reloads items for the current filter, and the folder list.
    ///
    /// Trash and folder filters are resolved by the CLI; the others are
    /// applied locally on the full item list.
    ///
    /// # Errors
    /// Any error from the store; the cached items are left as they were
    pub async fn refresh(&self) -> VaultResult<()> {
        let filter = self.filter();
        let items = match &filter {
            VaultFilter::Trash => self.store.list_trash().await?,
            VaultFilter::NoFolder => self.store.list_items_in_folder(None).await?,
            VaultFilter::Folder(id) => self.store.list_items_in_folder(Some(id.as_str())).await?,
            _ => self.store.list_items().await?,
        };
        let folders = self.store.list_folders().await?;
        debug!(items = items.len(), folders = folders.len(), filter = %filter.id(), "Vault view refreshed");

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.items = items;
            state.folders = folders;
        }
        self.notify();
        Ok(())
    }

    /// Switches filter and reloads
    ///
    /// # Errors
    /// Any error from [`Self::refresh`]
    pub async fn apply_filter(&self, filter: VaultFilter) -> VaultResult<()> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .filter = filter;
        self.refresh().await
    }

    /// Sets the search text; no reload needed
    pub fn set_search(&self, query: impl Into<String>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .search = query.into();
        self.notify();
    }

    /// Drops cached items, e.g. after locking
    pub fn clear(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.items.clear();
            state.folders.clear();
        }
        self.notify();
    }

    /// Current filter
    #[must_use]
    pub fn filter(&self) -> VaultFilter {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .filter
            .clone()
    }

    /// Cached folders
    #[must_use]
    pub fn folders(&self) -> Vec<Folder> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .folders
            .clone()
    }

    /// Cached items passing the filter and search
    #[must_use]
    pub fn items(&self) -> Vec<VaultItem> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .items
            .iter()
            .filter(|item| state.filter.matches(item) && matches_search(item, &state.search))
            .cloned()
            .collect()
    }

    /// Every cached item, unfiltered
    #[must_use]
    pub fn all_items(&self) -> Vec<VaultItem> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .clone()
    }

    /// Rows to show; a placeholder row when nothing matches
    #[must_use]
    pub fn display_items(&self) -> Vec<DisplayItem> {
        let rows: Vec<DisplayItem> = self.items().iter().map(vault_display_item).collect();
        if rows.is_empty() {
            vec![DisplayItem::placeholder(
                "No items found",
                "Try a different search or filter",
                Glyph::Search,
            )]
        } else {
            rows
        }
    }
}

//! View state store
//!
//! Holds the widget set, the status map and the shop identifier in a
//! `tokio::sync::watch` channel. Readers take snapshots or subscribe; only the
//! catalog loader and the status reconciler write, through crate-private
//! methods.
//!
//! ## Versioning
//!
//! Every widget-set replacement bumps `widgets_version`. A status map is only
//! published for the version it was computed from, so a slow batch for an
//! older set can never overwrite the statuses of a newer one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::types::{ShopContext, StatusMap, WidgetSet};

/// Where the panel is in its page-session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    /// No widgets yet (initial, failed first load, or an empty catalog)
    Empty,
    /// Catalog request in flight
    LoadingCatalog,
    /// Widget set present, statuses not yet complete for it
    StatusPending,
    /// Status map complete for the current widget set
    Reconciled,
    /// Page left; no further transitions
    Unmounted,
}

/// A widget set together with the version it was published under.
#[derive(Debug, Clone)]
pub struct WidgetGeneration {
    pub version: u64,
    pub widgets: Arc<WidgetSet>,
}

/// Snapshot of the panel's view state.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    widgets: Arc<WidgetSet>,
    widgets_version: u64,
    statuses: StatusMap,
    statuses_version: Option<u64>,
    shop: Option<ShopContext>,
    catalog_loading: bool,
    unmounted: bool,
}

impl ViewState {
    pub fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }

    /// Version of the current widget set; 0 until the first replacement.
    pub fn widgets_version(&self) -> u64 {
        self.widgets_version
    }

    /// Current widget set with its version.
    pub fn generation(&self) -> WidgetGeneration {
        WidgetGeneration {
            version: self.widgets_version,
            widgets: Arc::clone(&self.widgets),
        }
    }

    /// Statuses for the current widget set. Empty while reconciliation is pending.
    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    /// Shop recorded by the most recent status query.
    pub fn shop(&self) -> Option<&ShopContext> {
        self.shop.as_ref()
    }

    pub fn is_catalog_loading(&self) -> bool {
        self.catalog_loading
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    /// True when the status map was computed for the current widget set.
    pub fn is_reconciled(&self) -> bool {
        self.statuses_version == Some(self.widgets_version)
    }

    pub fn phase(&self) -> PanelPhase {
        if self.unmounted {
            PanelPhase::Unmounted
        } else if self.catalog_loading {
            PanelPhase::LoadingCatalog
        } else if self.widgets.is_empty() {
            PanelPhase::Empty
        } else if self.is_reconciled() {
            PanelPhase::Reconciled
        } else {
            PanelPhase::StatusPending
        }
    }

    /// Nothing left to wait for: no catalog request and no pending statuses.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.phase(),
            PanelPhase::Empty | PanelPhase::Reconciled | PanelPhase::Unmounted
        )
    }
}

/// Reactive holder for [`ViewState`]. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ViewStore {
    state: Arc<watch::Sender<ViewState>>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Wait until the state satisfies `predicate`, returning that state.
    pub async fn wait_for(&self, predicate: impl FnMut(&ViewState) -> bool) -> ViewState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(predicate).await {
            Ok(state) => state.clone(),
            // The sender lives as long as `self`
            Err(_) => self.snapshot(),
        };
        state
    }

    pub(crate) fn set_catalog_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            if state.unmounted || state.catalog_loading == loading {
                return false;
            }
            state.catalog_loading = loading;
            true
        });
    }

    /// Replace the widget set unless it is structurally identical to the
    /// current one. Returns the new version when a replacement happened.
    ///
    /// A replacement clears the status map: statuses for the old set are not
    /// statuses for the new one.
    pub(crate) fn replace_widgets(&self, widgets: WidgetSet) -> Option<u64> {
        let mut replaced = None;
        self.state.send_if_modified(|state| {
            if state.unmounted || *state.widgets == widgets {
                return false;
            }
            state.widgets_version += 1;
            state.widgets = Arc::new(widgets);
            state.statuses = StatusMap::new();
            state.statuses_version = None;
            replaced = Some(state.widgets_version);
            true
        });
        replaced
    }

    /// Publish statuses computed for widget-set `version`.
    ///
    /// Returns false (and changes nothing) when `version` has been superseded.
    pub(crate) fn apply_statuses(&self, version: u64, statuses: StatusMap) -> bool {
        self.state.send_if_modified(|state| {
            if state.unmounted {
                return false;
            }
            if state.widgets_version != version {
                debug!(
                    batch_version = version,
                    current_version = state.widgets_version,
                    "Dropping statuses for superseded widget set"
                );
                return false;
            }
            state.statuses = statuses;
            state.statuses_version = Some(version);
            true
        })
    }

    /// Record the shop a status query ran against. Last writer wins.
    pub(crate) fn record_shop(&self, shop: &ShopContext) {
        self.state.send_if_modified(|state| {
            if state.unmounted || state.shop.as_ref() == Some(shop) {
                return false;
            }
            state.shop = Some(shop.clone());
            true
        });
    }

    /// Enter the terminal state. Later writes are ignored.
    pub(crate) fn unmount(&self) {
        self.state.send_if_modified(|state| {
            if state.unmounted {
                return false;
            }
            state.unmounted = true;
            state.catalog_loading = false;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::widget;

    fn set(ids: &[(&str, &str)]) -> WidgetSet {
        WidgetSet::new(ids.iter().map(|(id, kind)| widget(id, kind)).collect()).unwrap()
    }

    fn statuses(entries: &[(&str, bool)]) -> StatusMap {
        entries
            .iter()
            .map(|(id, active)| (id.to_string(), *active))
            .collect()
    }

    #[test]
    fn test_initial_state_is_empty() {
        let store = ViewStore::new();
        let state = store.snapshot();
        assert_eq!(state.phase(), PanelPhase::Empty);
        assert_eq!(state.widgets_version(), 0);
        assert!(state.statuses().is_empty());
        assert!(state.shop().is_none());
    }

    #[test]
    fn test_phase_transitions() {
        let store = ViewStore::new();

        store.set_catalog_loading(true);
        assert_eq!(store.snapshot().phase(), PanelPhase::LoadingCatalog);

        let version = store.replace_widgets(set(&[("w1", "banner")])).unwrap();
        store.set_catalog_loading(false);
        assert_eq!(store.snapshot().phase(), PanelPhase::StatusPending);

        assert!(store.apply_statuses(version, statuses(&[("w1", true)])));
        assert_eq!(store.snapshot().phase(), PanelPhase::Reconciled);

        store.replace_widgets(set(&[("w1", "banner"), ("w2", "popup")]));
        let state = store.snapshot();
        assert_eq!(state.phase(), PanelPhase::StatusPending);
        assert!(state.statuses().is_empty());

        store.unmount();
        assert_eq!(store.snapshot().phase(), PanelPhase::Unmounted);
    }

    #[test]
    fn test_identical_set_keeps_version() {
        let store = ViewStore::new();
        assert_eq!(store.replace_widgets(set(&[("w1", "banner")])), Some(1));
        assert_eq!(store.replace_widgets(set(&[("w1", "banner")])), None);
        assert_eq!(store.snapshot().widgets_version(), 1);
    }

    #[test]
    fn test_identical_empty_set_is_not_a_replacement() {
        let store = ViewStore::new();
        assert_eq!(store.replace_widgets(WidgetSet::empty()), None);
        assert_eq!(store.snapshot().widgets_version(), 0);
    }

    #[test]
    fn test_stale_statuses_are_dropped() {
        let store = ViewStore::new();
        let v1 = store.replace_widgets(set(&[("w1", "banner")])).unwrap();
        let v2 = store.replace_widgets(set(&[("w2", "popup")])).unwrap();

        assert!(store.apply_statuses(v2, statuses(&[("w2", true)])));
        assert!(!store.apply_statuses(v1, statuses(&[("w1", false)])));

        let state = store.snapshot();
        assert_eq!(state.statuses(), &statuses(&[("w2", true)]));
        assert!(state.is_reconciled());
    }

    #[test]
    fn test_unmounted_store_ignores_writes() {
        let store = ViewStore::new();
        store.unmount();

        assert_eq!(store.replace_widgets(set(&[("w1", "banner")])), None);
        store.record_shop(&ShopContext::new("store.myshopify.com"));
        store.set_catalog_loading(true);

        let state = store.snapshot();
        assert!(state.widgets().is_empty());
        assert!(state.shop().is_none());
        assert!(!state.is_catalog_loading());
    }

    #[test]
    fn test_record_shop_last_writer_wins() {
        let store = ViewStore::new();
        store.record_shop(&ShopContext::new("a.myshopify.com"));
        store.record_shop(&ShopContext::new("b.myshopify.com"));
        assert_eq!(
            store.snapshot().shop().map(|s| s.as_str()),
            Some("b.myshopify.com")
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_replacement() {
        let store = ViewStore::new();
        let mut rx = store.subscribe();

        store.replace_widgets(set(&[("w1", "banner")]));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().widgets_version(), 1);

        // Identical payload: no notification
        store.replace_widgets(set(&[("w1", "banner")]));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_wait_for_reconciled() {
        let store = ViewStore::new();
        let version = store.replace_widgets(set(&[("w1", "banner")])).unwrap();

        let writer = store.clone();
        tokio::spawn(async move {
            writer.apply_statuses(version, statuses(&[("w1", false)]));
        });

        let state = store.wait_for(ViewState::is_reconciled).await;
        assert_eq!(state.statuses().get("w1"), Some(false));
    }
}

//! Single-flight catalog loader
//!
//! At most one catalog request is outstanding at a time. A load requested
//! while another is in flight returns [`LoadOutcome::AlreadyInFlight`]
//! without touching the network; it does not share the in-flight result.
//!
//! The loader never calls the reconciler. It replaces the widget set in the
//! [`ViewStore`], and the reconciler reacts to that replacement.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::source::CatalogSource;
use crate::store::ViewStore;
use crate::types::WidgetSet;

/// Loader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderState {
    Idle,
    InFlight,
}

/// What a call to [`CatalogLoader::load`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Another load was in flight; no request was made
    AlreadyInFlight,
    /// Catalog matched the current widget set; nothing changed
    Unchanged { version: u64 },
    /// Widget set replaced under a new version
    Replaced { version: u64, count: usize },
    /// The panel was unmounted; no request was made
    Unmounted,
}

/// Releases the in-flight state when the load finishes or is dropped.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    store: &'a ViewStore,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store.set_catalog_loading(false);
        self.flag.store(false, Ordering::Release);
    }
}

/// Loads the widget catalog into the view store.
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    store: ViewStore,
    in_flight: AtomicBool,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>, store: ViewStore) -> Self {
        Self {
            source,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> LoaderState {
        if self.in_flight.load(Ordering::Acquire) {
            LoaderState::InFlight
        } else {
            LoaderState::Idle
        }
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.store.set_catalog_loading(true);
        Some(InFlightGuard {
            flag: &self.in_flight,
            store: &self.store,
        })
    }

    /// Fetch the catalog and publish it if it changed.
    ///
    /// On failure the widget set is left exactly as it was.
    pub async fn load(&self) -> Result<LoadOutcome, FetchError> {
        let Some(_guard) = self.try_begin() else {
            debug!("Catalog load already in flight, skipping");
            return Ok(LoadOutcome::AlreadyInFlight);
        };

        let widgets = self
            .source
            .fetch_catalog()
            .await
            .and_then(WidgetSet::new)
            .map_err(|e| {
                warn!(error = %e, "Catalog load failed, keeping current widget set");
                e
            })?;

        let count = widgets.len();
        match self.store.replace_widgets(widgets) {
            Some(version) => {
                info!(version, count, "Widget set replaced");
                Ok(LoadOutcome::Replaced { version, count })
            }
            None => {
                let version = self.store.snapshot().widgets_version();
                debug!(version, count, "Catalog unchanged");
                Ok(LoadOutcome::Unchanged { version })
            }
        }
    }
}

//! Status reconciler
//!
//! Fans out one theme status query per widget, waits for every query to
//! settle, and publishes the resulting [`StatusMap`] for the widget-set
//! version it was computed from.
//!
//! ## Triggering
//!
//! [`StatusReconciler::run`] subscribes to the [`ViewStore`] and starts a batch
//! whenever the widget-set version changes. Superseded batches are not
//! cancelled; the store drops their results when they arrive.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::source::StatusSource;
use crate::store::{ViewState, ViewStore, WidgetGeneration};
use crate::types::{ShopContext, StatusMap, WidgetSet};

/// Computes and publishes widget activation statuses.
pub struct StatusReconciler {
    source: Arc<dyn StatusSource>,
    shop: ShopContext,
    store: ViewStore,
}

impl StatusReconciler {
    pub fn new(source: Arc<dyn StatusSource>, shop: ShopContext, store: ViewStore) -> Self {
        Self {
            source,
            shop,
            store,
        }
    }

    pub fn shop(&self) -> &ShopContext {
        &self.shop
    }

    /// Query every widget concurrently and collect one status per widget.
    ///
    /// A failed query counts as inactive; it never fails the batch.
    pub async fn reconcile(&self, widgets: &WidgetSet) -> StatusMap {
        let queries = widgets.iter().map(|widget| async move {
            self.store.record_shop(&self.shop);

            let active = match self.source.is_active(&self.shop, &widget.kind).await {
                Ok(active) => active,
                Err(e) => {
                    warn!(
                        widget_id = %widget.id,
                        kind = %widget.kind,
                        error = %e,
                        "Status query failed, treating widget as inactive"
                    );
                    false
                }
            };

            (widget.id.clone(), active)
        });

        join_all(queries).await.into_iter().collect()
    }

    /// Reconcile one widget-set generation and publish the result.
    ///
    /// Returns false when the generation was superseded before the batch
    /// finished and the result was dropped.
    pub async fn run_batch(&self, generation: WidgetGeneration) -> bool {
        debug!(
            version = generation.version,
            count = generation.widgets.len(),
            "Starting status batch"
        );

        let statuses = self.reconcile(&generation.widgets).await;
        let active = statuses.iter().filter(|(_, active)| *active).count();
        let applied = self.store.apply_statuses(generation.version, statuses);

        if applied {
            info!(
                version = generation.version,
                widgets = generation.widgets.len(),
                active,
                "Widget statuses reconciled"
            );
        } else {
            debug!(version = generation.version, "Status batch was stale, discarded");
        }

        applied
    }

    /// Drive reconciliation from widget-set replacements until shutdown.
    ///
    /// `updates` should be subscribed before the first catalog load so no
    /// replacement is missed; a replacement that already happened is picked
    /// up on entry. Batches still running at shutdown are aborted.
    pub async fn run(
        self: Arc<Self>,
        mut updates: watch::Receiver<ViewState>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut batches = JoinSet::new();
        let mut last_version = 0;

        let initial = updates.borrow_and_update().generation();
        if initial.version != last_version {
            last_version = initial.version;
            self.spawn_batch(&mut batches, initial);
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Status reconciler shutting down");
                    break;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let generation = updates.borrow_and_update().generation();
                    if generation.version != last_version {
                        last_version = generation.version;
                        self.spawn_batch(&mut batches, generation);
                    }
                }
                Some(joined) = batches.join_next(), if !batches.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "Status batch panicked");
                        }
                    }
                }
            }
        }

        batches.abort_all();
    }

    fn spawn_batch(self: &Arc<Self>, batches: &mut JoinSet<bool>, generation: WidgetGeneration) {
        let reconciler = Arc::clone(self);
        batches.spawn(async move { reconciler.run_batch(generation).await });
    }
}

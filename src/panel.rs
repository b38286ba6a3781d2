//! Widget panel session
//!
//! Wires the catalog loader, the status reconciler and the view store for one
//! page session: `mount` starts reconciliation and loads the catalog,
//! `refresh` is the explicit retry path, `unmount` abandons in-flight work.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::PanelConfig;
use crate::error::FetchError;
use crate::loader::{CatalogLoader, LoadOutcome, LoaderState};
use crate::reconciler::StatusReconciler;
use crate::source::{self, CatalogSource, HttpCatalogSource, HttpStatusSource, StatusSource};
use crate::store::{ViewState, ViewStore};
use crate::types::ShopContext;
use crate::view::WidgetRow;

/// One page session of the widget panel.
pub struct WidgetPanel {
    store: ViewStore,
    loader: CatalogLoader,
    reconciler: Arc<StatusReconciler>,
    shutdown_tx: broadcast::Sender<()>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl WidgetPanel {
    /// Create a panel over the given sources. Nothing runs until [`mount`](Self::mount).
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        status: Arc<dyn StatusSource>,
        shop: ShopContext,
    ) -> Self {
        let store = ViewStore::new();
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            loader: CatalogLoader::new(catalog, store.clone()),
            reconciler: Arc::new(StatusReconciler::new(status, shop, store.clone())),
            store,
            shutdown_tx,
            driver: Mutex::new(None),
        }
    }

    /// Create a panel talking to the configured HTTP endpoints.
    pub fn from_config(config: &PanelConfig) -> Result<Self, FetchError> {
        let client = source::http::build_client(config.request_timeout)?;
        let catalog = HttpCatalogSource::from_config(client.clone(), config);
        let status = HttpStatusSource::from_config(client, config);

        info!(
            catalog_url = catalog.url(),
            status_url = status.url(),
            shop = %config.shop,
            "Widget panel configured"
        );

        Ok(Self::new(
            Arc::new(catalog),
            Arc::new(status),
            config.shop.clone(),
        ))
    }

    /// Start the reconciler and perform the initial catalog load.
    ///
    /// Mounting twice does not start a second reconciler; the load still goes
    /// through the single-flight loader.
    pub async fn mount(&self) -> Result<LoadOutcome, FetchError> {
        self.refresh().await
    }

    /// Reload the catalog. A no-op while another load is in flight.
    ///
    /// Starts the reconciler first if the panel was never mounted, so every
    /// widget-set replacement gets a status batch.
    pub async fn refresh(&self) -> Result<LoadOutcome, FetchError> {
        if !self.ensure_driver().await {
            warn!("Refresh requested after unmount, ignoring");
            return Ok(LoadOutcome::Unmounted);
        }
        self.loader.load().await
    }

    /// Spawn the reconciler driver once. Returns false after unmount.
    async fn ensure_driver(&self) -> bool {
        let mut driver = self.driver.lock().await;
        if self.store.snapshot().is_unmounted() {
            return false;
        }
        if driver.is_none() {
            let updates = self.store.subscribe();
            let shutdown = self.shutdown_tx.subscribe();
            let reconciler = Arc::clone(&self.reconciler);
            *driver = Some(tokio::spawn(reconciler.run(updates, shutdown)));
            info!(shop = %self.reconciler.shop(), "Widget panel mounted");
        }
        true
    }

    /// Leave the page: freeze the view state and abandon in-flight work.
    pub async fn unmount(&self) {
        self.store.unmount();
        let _ = self.shutdown_tx.send(());

        if let Some(driver) = self.driver.lock().await.take() {
            driver.abort();
        }
        info!("Widget panel unmounted");
    }

    /// Wait until no catalog load or status batch is pending.
    pub async fn wait_settled(&self) -> ViewState {
        self.store.wait_for(ViewState::is_settled).await
    }

    pub fn state(&self) -> ViewState {
        self.store.snapshot()
    }

    pub fn rows(&self) -> Vec<WidgetRow> {
        self.store.snapshot().rows()
    }

    pub fn loader_state(&self) -> LoaderState {
        self.loader.state()
    }

    pub fn store(&self) -> &ViewStore {
        &self.store
    }
}

//! Widget Panel - storefront widget catalog and theme status
//!
//! Lists the widgets a merchant can add to their storefront and shows, per
//! widget, whether it is active in the published theme.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  replace_widgets   ┌─────────────┐  subscribe   ┌──────────────────┐
//! │ CatalogLoader │ ─────────────────▶ │  ViewStore  │ ───────────▶ │ StatusReconciler │
//! │ (single-      │                    │ (watch)     │ ◀─────────── │ (fan-out/fan-in) │
//! │  flight)      │                    └─────────────┘ apply_statuses└──────────────────┘
//! └───────┬───────┘                           │                              │
//!         ▼                                   ▼                              ▼
//!   CatalogSource                        WidgetRow                      StatusSource
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use widget_panel::{MockCatalogSource, MockStatusSource, ShopContext, WidgetPanel};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let panel = WidgetPanel::new(
//!     Arc::new(MockCatalogSource::new(vec![])),
//!     Arc::new(MockStatusSource::new()),
//!     ShopContext::new("store.myshopify.com"),
//! );
//!
//! panel.mount().await?;
//! let state = panel.wait_settled().await;
//! for row in state.rows() {
//!     println!("{} {:?}", row.widget.name, row.action);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod panel;
pub mod reconciler;
pub mod source;
pub mod store;
pub mod types;
pub mod view;

pub use config::{Args, PanelConfig};
pub use error::{ConfigError, FetchError, Result};
pub use loader::{CatalogLoader, LoadOutcome, LoaderState};
pub use panel::WidgetPanel;
pub use reconciler::StatusReconciler;
pub use source::{
    CatalogSource, HttpCatalogSource, HttpStatusSource, MockCatalogSource, MockStatusSource,
    StatusSource,
};
pub use store::{PanelPhase, ViewState, ViewStore, WidgetGeneration};
pub use types::{ShopContext, StatusMap, Widget, WidgetSet, DEFAULT_SHOP};
pub use view::{theme_editor_link, WidgetAction, WidgetRow};

//! Remote sources for the widget catalog and theme activation status.
//!
//! Provides a trait-based seam over the two HTTP endpoints the panel talks to:
//! - HTTP implementations backed by reqwest
//! - Mock implementations for testing

pub mod http;
pub mod mock;
pub mod traits;

pub use http::{HttpCatalogSource, HttpStatusSource};
pub use mock::{MockCatalogSource, MockStatusSource};
pub use traits::{CatalogSource, StatusSource};

//! Core traits for remote widget sources.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{ShopContext, Widget};

/// Where the widget catalog comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full catalog in one request.
    async fn fetch_catalog(&self) -> Result<Vec<Widget>, FetchError>;
}

/// Where theme activation status comes from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Whether a block of the given kind is active in the shop's published theme.
    async fn is_active(&self, shop: &ShopContext, kind: &str) -> Result<bool, FetchError>;
}

//! Mock sources for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::traits::{CatalogSource, StatusSource};
use crate::error::FetchError;
use crate::types::{ShopContext, Widget};

/// Mock catalog source.
///
/// Serves a configurable catalog (or a configurable failure) after an
/// optional delay, and counts how many requests reached it.
pub struct MockCatalogSource {
    response: Mutex<Result<Vec<Widget>, FetchError>>,
    delay: Option<Duration>,
    call_count: AtomicU32,
}

impl MockCatalogSource {
    /// Create a mock serving the given catalog.
    pub fn new(widgets: Vec<Widget>) -> Self {
        Self {
            response: Mutex::new(Ok(widgets)),
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Create a mock that fails every request with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            response: Mutex::new(Err(status_error(status))),
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Delay each response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve a different catalog from now on.
    pub async fn set_widgets(&self, widgets: Vec<Widget>) {
        *self.response.lock().await = Ok(widgets);
    }

    /// Fail from now on with the given HTTP status.
    pub async fn set_failure(&self, status: u16) {
        *self.response.lock().await = Err(status_error(status));
    }

    /// Number of requests that reached the source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_catalog(&self) -> Result<Vec<Widget>, FetchError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.response.lock().await.clone()
    }
}

/// Mock status source.
///
/// Kinds are inactive unless marked active; failing kinds answer HTTP 500.
/// Per-kind delays let tests control completion order inside a batch.
#[derive(Default)]
pub struct MockStatusSource {
    active: HashSet<String>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    call_count: AtomicU32,
    shops: Mutex<Vec<ShopContext>>,
}

impl MockStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the given kind as active.
    pub fn with_active(mut self, kind: impl Into<String>) -> Self {
        self.active.insert(kind.into());
        self
    }

    /// Fail queries for the given kind with HTTP 500.
    pub fn with_failure(mut self, kind: impl Into<String>) -> Self {
        self.failing.insert(kind.into());
        self
    }

    /// Delay answers for the given kind.
    pub fn with_delay(mut self, kind: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(kind.into(), delay);
        self
    }

    /// Number of queries that reached the source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shops seen so far, in arrival order.
    pub async fn shops(&self) -> Vec<ShopContext> {
        self.shops.lock().await.clone()
    }
}

#[async_trait]
impl StatusSource for MockStatusSource {
    async fn is_active(&self, shop: &ShopContext, kind: &str) -> Result<bool, FetchError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.shops.lock().await.push(shop.clone());

        if let Some(delay) = self.delays.get(kind) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(kind) {
            return Err(status_error(500));
        }

        Ok(self.active.contains(kind))
    }
}

fn status_error(status: u16) -> FetchError {
    FetchError::Status {
        status,
        body: "mock failure".to_string(),
    }
}

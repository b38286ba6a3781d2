//! HTTP sources for the widget catalog and theme status endpoints.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use super::traits::{CatalogSource, StatusSource};
use crate::config::PanelConfig;
use crate::error::FetchError;
use crate::types::{ShopContext, Widget};

/// Header that skips the tunnel provider's browser interstitial in dev setups.
const SKIP_TUNNEL_WARNING: &str = "ngrok-skip-browser-warning";

/// Build the HTTP client shared by both sources.
///
/// Every request asks for JSON and bypasses the tunnel warning page.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, FetchError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(SKIP_TUNNEL_WARNING, header::HeaderValue::from_static("true"));

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(FetchError::from)
}

/// Join a base URL and an endpoint path without doubling slashes.
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read the body of a successful response, or turn the status into an error.
async fn success_body(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.text().await?)
}

/// Catalog endpoint (`GET {api_url}/api/Widget/GetAll` by default).
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    url: String,
}

impl HttpCatalogSource {
    /// Create a catalog source for the given endpoint URL.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Create from panel configuration.
    pub fn from_config(client: Client, config: &PanelConfig) -> Self {
        Self::new(client, endpoint_url(&config.api_url, &config.catalog_path))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_catalog(&self) -> Result<Vec<Widget>, FetchError> {
        debug!(url = %self.url, "Fetching widget catalog");

        let response = self.client.get(&self.url).send().await?;
        let body = success_body(response).await?;
        let widgets: Vec<Widget> = serde_json::from_str(&body)?;

        debug!(count = widgets.len(), "Widget catalog received");
        Ok(widgets)
    }
}

/// Theme status response body. A missing or null `active` means inactive.
#[derive(Debug, Deserialize)]
struct ActiveThemeResponse {
    #[serde(default)]
    active: Option<bool>,
}

/// Theme status endpoint (`GET {api_url}/api/Theme/ActiveTheme` by default).
#[derive(Clone)]
pub struct HttpStatusSource {
    client: Client,
    url: String,
    access_token: String,
}

impl HttpStatusSource {
    /// Create a status source for the given endpoint URL and access token.
    pub fn new(client: Client, url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            access_token: access_token.into(),
        }
    }

    /// Create from panel configuration.
    pub fn from_config(client: Client, config: &PanelConfig) -> Self {
        Self::new(
            client,
            endpoint_url(&config.api_url, &config.status_path),
            config.access_token.clone(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for HttpStatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStatusSource")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn is_active(&self, shop: &ShopContext, kind: &str) -> Result<bool, FetchError> {
        debug!(shop = %shop, kind, "Querying theme status");

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("shop", shop.as_str()),
                ("accessToken", self.access_token.as_str()),
                ("blockName", kind),
            ])
            .send()
            .await?;

        let body = success_body(response).await?;
        let parsed: ActiveThemeResponse = serde_json::from_str(&body)?;

        Ok(parsed.active.unwrap_or(false))
    }
}

//! Configuration for the widget panel
//!
//! CLI arguments and environment variable handling using clap. The hosting
//! app injects these values; the access token in particular must come from
//! the environment or a secret store, never from source.

use std::fmt;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::error::ConfigError;
use crate::types::ShopContext;

/// Default catalog endpoint path
pub const DEFAULT_CATALOG_PATH: &str = "/api/Widget/GetAll";

/// Default theme status endpoint path
pub const DEFAULT_STATUS_PATH: &str = "/api/Theme/ActiveTheme";

/// Widget panel - storefront widget catalog and theme status
#[derive(Parser, Clone)]
#[command(name = "widget-panel")]
#[command(about = "List storefront widgets and whether each is active in the published theme")]
pub struct Args {
    /// Base URL of the widget API (e.g. "https://api.example.com")
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Base URL exposed to the embedded app build; preferred over API_URL when set
    #[arg(long, env = "VITE_API_URL")]
    pub vite_api_url: Option<String>,

    /// Public API key for the host platform bridge (not used by the pipeline)
    #[arg(long, env = "SHOPIFY_API_KEY")]
    pub shopify_api_key: Option<String>,

    /// Access token for the theme status endpoint
    #[arg(long, env = "WIDGET_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Shop domain the panel is embedded in
    #[arg(long, env = "SHOPIFY_SHOP")]
    pub shop: Option<String>,

    /// Catalog endpoint path, relative to the API URL
    #[arg(long, env = "CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
    pub catalog_path: String,

    /// Theme status endpoint path, relative to the API URL
    #[arg(long, env = "STATUS_PATH", default_value = DEFAULT_STATUS_PATH)]
    pub status_path: String,

    /// Per-request timeout in milliseconds (unset: no timeout)
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// How long to wait for theme statuses before printing pending rows
    #[arg(long, env = "WAIT_TIMEOUT_MS", default_value = "30000")]
    pub wait_timeout_ms: u64,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// API base URL, preferring VITE_API_URL over API_URL
    pub fn resolved_api_url(&self) -> Option<&str> {
        self.vite_api_url
            .as_deref()
            .or(self.api_url.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let api_url = self.resolved_api_url().ok_or(ConfigError::Missing("API_URL"))?;
        let parsed = Url::parse(api_url).map_err(|e| ConfigError::Invalid {
            field: "API_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "API_URL",
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        match self.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => {}
            _ => return Err(ConfigError::Missing("WIDGET_ACCESS_TOKEN")),
        }

        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "REQUEST_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Validate and convert to the library configuration
    pub fn panel_config(&self) -> Result<PanelConfig, ConfigError> {
        self.validate()?;

        Ok(PanelConfig {
            api_url: self.resolved_api_url().unwrap_or_default().to_string(),
            catalog_path: self.catalog_path.clone(),
            status_path: self.status_path.clone(),
            access_token: self
                .access_token
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            shopify_api_key: self.shopify_api_key.clone(),
            shop: ShopContext::from_host(self.shop.as_deref()),
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        })
    }
}

/// Validated panel configuration.
#[derive(Clone)]
pub struct PanelConfig {
    pub api_url: String,
    pub catalog_path: String,
    pub status_path: String,
    pub access_token: String,
    pub shopify_api_key: Option<String>,
    pub shop: ShopContext,
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("api_url", &self.api_url)
            .field("catalog_path", &self.catalog_path)
            .field("status_path", &self.status_path)
            .field("access_token", &"<redacted>")
            .field("shopify_api_key", &self.shopify_api_key)
            .field("shop", &self.shop)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

//! Widget Panel - storefront widget catalog and theme status

use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use widget_panel::{Args, WidgetAction, WidgetPanel, WidgetRow};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args.log_level, &args.log_format);

    let config = match args.panel_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("API: {}", config.api_url);
    info!("Shop: {}", config.shop);
    if config.shopify_api_key.is_none() {
        warn!("SHOPIFY_API_KEY not set; host bridge features will be unavailable");
    }

    let panel = WidgetPanel::from_config(&config)?;

    let loaded = panel.mount().await;
    if let Err(e) = &loaded {
        error!(error = %e, "Catalog load failed, no widgets available");
    }

    let wait = Duration::from_millis(args.wait_timeout_ms);
    let state = match tokio::time::timeout(wait, panel.wait_settled()).await {
        Ok(state) => state,
        Err(_) => {
            warn!(
                timeout_ms = args.wait_timeout_ms,
                "Timed out waiting for theme status, showing pending rows"
            );
            panel.state()
        }
    };

    let rows = state.rows();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_rows(&rows);
    }

    panel.unmount().await;

    if loaded.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(log_level: &str, log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("widget_panel={},info", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_rows(rows: &[WidgetRow]) {
    if rows.is_empty() {
        println!("No widgets available");
        return;
    }

    let name_width = rows
        .iter()
        .map(|r| r.widget.name.len())
        .max()
        .unwrap_or(0)
        .max(4);
    let kind_width = rows
        .iter()
        .map(|r| r.widget.kind.len())
        .max()
        .unwrap_or(0)
        .max(4);

    println!("{:<name_width$}  {:<kind_width$}  ACTION", "NAME", "KIND");
    for row in rows {
        let action = match &row.action {
            WidgetAction::Active => "Active".to_string(),
            WidgetAction::AddWidget { link } => format!("Add widget {}", link),
            WidgetAction::Pending => "Pending".to_string(),
        };
        println!(
            "{:<name_width$}  {:<kind_width$}  {}",
            row.widget.name, row.widget.kind, action
        );
    }
}

//! Folio portfolio summary - entry point.
//!
//! Loads the tracked wallet list, fetches each wallet's on-chain account
//! state, derives balances/positions/equity, and prints the portfolio
//! summary as JSON.

mod config;
mod error;
mod logging;

use anyhow::Result;
use clap::Parser;
use config::AppConfig;
use folio_chain::{DriftClient, HyperliquidClient};
use folio_portfolio::PortfolioService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Read-only portfolio summary over Drift and Hyperliquid wallets.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FOLIO_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Additional wallet address to include (repeatable)
    #[arg(short, long)]
    wallet: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging();

    info!("Starting folio v{}", env!("CARGO_PKG_VERSION"));

    // Config path resolution: CLI arg > FOLIO_CONFIG env var > default.
    let config_path = args
        .config
        .or_else(|| std::env::var("FOLIO_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let mut config = if std::path::Path::new(&config_path).exists() {
        info!(config_path = %config_path, "Loading configuration");
        AppConfig::from_file(&config_path)?
    } else {
        warn!(config_path = %config_path, "Config file not found, using defaults");
        AppConfig::default()
    };
    config.wallets.extend(args.wallet);

    if config.wallets.is_empty() {
        anyhow::bail!("no wallets configured; add them to the config file or pass --wallet");
    }

    let timeout = Duration::from_millis(config.request_timeout_ms);
    let drift = Arc::new(DriftClient::with_timeout(&config.drift_api_url, timeout)?);
    let hyperliquid = Arc::new(HyperliquidClient::with_timeout(
        &config.hyperliquid_info_url,
        timeout,
    )?);

    // Warm up both clients; a failure here degrades to per-wallet fetch
    // failures later instead of aborting the whole run.
    if let Err(err) = drift.ready().await {
        warn!(error = %err, "Drift client warm-up failed");
    }
    if let Err(err) = hyperliquid.ready().await {
        warn!(error = %err, "Hyperliquid client warm-up failed");
    }

    let service = PortfolioService::new(drift, hyperliquid, config.max_subaccounts);
    let summary = service.summarize(&config.wallets).await?;

    if !summary.failed.is_empty() {
        warn!(failed = ?summary.failed, "some wallets could not be fetched");
    }
    info!(
        wallets = summary.wallets.len(),
        open_positions = summary.open_positions_count,
        "summary computed"
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

//! Application configuration.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, loaded from a TOML file with `FOLIO_*`
/// environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracked wallet addresses (Solana or EVM).
    #[serde(default)]
    pub wallets: Vec<String>,

    /// Drift data API base URL.
    #[serde(default = "default_drift_api_url")]
    pub drift_api_url: String,

    /// Hyperliquid info endpoint URL.
    #[serde(default = "default_hyperliquid_info_url")]
    pub hyperliquid_info_url: String,

    /// Per-request timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Highest sub-account id probed per wallet. Default: 10.
    #[serde(default = "default_max_subaccounts")]
    pub max_subaccounts: u16,
}

fn default_drift_api_url() -> String {
    "https://data.api.drift.trade".to_string()
}

fn default_hyperliquid_info_url() -> String {
    "https://api.hyperliquid.xyz/info".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_subaccounts() -> u16 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wallets: Vec::new(),
            drift_api_url: default_drift_api_url(),
            hyperliquid_info_url: default_hyperliquid_info_url(),
            request_timeout_ms: default_request_timeout_ms(),
            max_subaccounts: default_max_subaccounts(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, with `FOLIO_*` environment
    /// variables taking precedence over file values.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("FOLIO"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

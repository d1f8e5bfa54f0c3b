//! Hyperliquid client over the exchange `info` REST endpoint.
//!
//! The exchange reports positions and prices as decimal strings in coin
//! units, not fixed-point integers. This adapter rescales them into the
//! raw-record representation the calculators expect (base at 1e9, quote
//! and prices at 1e6), using the coin universe fetched during `ready()`
//! to map coin symbols to market indices.

use crate::client::{ChainClient, SubaccountProbe};
use crate::error::{ChainError, ChainResult};
use async_trait::async_trait;
use dashmap::DashMap;
use folio_core::{
    MarketKind, MarketMetadata, OraclePrice, RawPerpPosition, RawSpotPosition, SpotInterest,
    WalletAddress, PRICE_SCALE,
};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base decimals used when rescaling coin-unit sizes to raw records.
const BASE_SCALE: u32 = 9;

/// Funding rate fixed-point scale (1e9).
const FUNDING_SCALE: u32 = 9;

/// Request body for the info endpoint.
#[derive(Debug, Serialize)]
struct InfoRequest {
    #[serde(rename = "type")]
    request_type: String,
}

/// Request body for user-scoped info queries.
#[derive(Debug, Serialize)]
struct UserInfoRequest {
    #[serde(rename = "type")]
    request_type: String,
    user: String,
}

/// One universe entry from the meta response.
#[derive(Debug, Deserialize)]
struct UniverseEntry {
    name: String,
}

/// Per-asset context from metaAndAssetCtxs: oracle price and funding.
#[derive(Debug, Deserialize)]
struct AssetCtxDto {
    #[serde(rename = "oraclePx")]
    oracle_px: Option<String>,
    funding: Option<String>,
}

/// User account state from the clearinghouseState query.
#[derive(Debug, Deserialize)]
struct UserStateResponse {
    #[serde(rename = "assetPositions", default)]
    asset_positions: Vec<AssetPositionEntry>,
    withdrawable: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetPositionEntry {
    position: AssetPositionDto,
}

/// One position: signed size in coin units, entry price in USD.
#[derive(Debug, Deserialize)]
struct AssetPositionDto {
    coin: String,
    szi: String,
    #[serde(rename = "entryPx")]
    entry_px: Option<String>,
}

/// Cached per-market state refreshed from metaAndAssetCtxs.
#[derive(Debug, Clone, Copy)]
struct MarketCtx {
    oracle_price: Option<i64>,
    funding_rate: Option<i64>,
}

/// Client for the Hyperliquid info endpoint.
pub struct HyperliquidClient {
    client: Client,
    info_url: String,
    /// Coin symbol -> market index, from the meta universe.
    coin_index: DashMap<String, u16>,
    /// Market index -> coin symbol.
    index_coin: DashMap<u16, String>,
    /// Market index -> oracle/funding snapshot.
    ctxs: DashMap<u16, MarketCtx>,
}

impl HyperliquidClient {
    /// Create a client with the default request timeout.
    pub fn new(info_url: impl Into<String>) -> ChainResult<Self> {
        Self::with_timeout(info_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(info_url: impl Into<String>, timeout: Duration) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            info_url: info_url.into(),
            coin_index: DashMap::new(),
            index_coin: DashMap::new(),
            ctxs: DashMap::new(),
        })
    }

    /// Explicit warm-up: loads the coin universe and the first asset-ctx
    /// snapshot. Must run before position fetches so coin symbols can be
    /// mapped to market indices.
    pub async fn ready(&self) -> ChainResult<()> {
        self.refresh_ctxs().await?;
        info!(
            url = %self.info_url,
            markets = self.coin_index.len(),
            "Hyperliquid universe loaded"
        );
        Ok(())
    }

    async fn post_info<T: serde::de::DeserializeOwned>(
        &self,
        body: &impl Serialize,
    ) -> ChainResult<T> {
        let response = self
            .client
            .post(&self.info_url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChainError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Http(format!("HTTP {status}: {body}")));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ChainError::Decode(format!("failed to parse response: {e}")))
    }

    /// Refresh the universe and per-market oracle/funding snapshot from
    /// metaAndAssetCtxs: a two-element array `[meta, assetCtxs]`.
    async fn refresh_ctxs(&self) -> ChainResult<()> {
        let request = InfoRequest {
            request_type: "metaAndAssetCtxs".to_string(),
        };
        let body: serde_json::Value = self.post_info(&request).await?;

        let universe: Vec<UniverseEntry> = body
            .get(0)
            .and_then(|meta| meta.get("universe"))
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| ChainError::Decode("missing meta universe".to_string()))?;

        let ctxs: Vec<AssetCtxDto> = body
            .get(1)
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        for (idx, entry) in universe.iter().enumerate() {
            let market_index = idx as u16;
            self.coin_index.insert(entry.name.clone(), market_index);
            self.index_coin.insert(market_index, entry.name.clone());

            let ctx = ctxs.get(idx);
            self.ctxs.insert(
                market_index,
                MarketCtx {
                    oracle_price: ctx
                        .and_then(|c| c.oracle_px.as_deref())
                        .and_then(|px| parse_scaled(px, PRICE_SCALE)),
                    funding_rate: ctx
                        .and_then(|c| c.funding.as_deref())
                        .and_then(|f| parse_scaled(f, FUNDING_SCALE)),
                },
            );
        }

        debug!(markets = self.ctxs.len(), "asset contexts refreshed");
        Ok(())
    }

    async fn ensure_universe(&self) -> ChainResult<()> {
        if self.coin_index.is_empty() {
            self.refresh_ctxs().await?;
        }
        Ok(())
    }

    async fn fetch_user_state(&self, wallet: &WalletAddress) -> ChainResult<UserStateResponse> {
        let request = UserInfoRequest {
            request_type: "clearinghouseState".to_string(),
            user: wallet.as_str().to_string(),
        };
        self.post_info(&request).await
    }
}

/// Parse a decimal string and rescale it to a fixed-point integer.
/// Returns `None` for unparseable or out-of-range values.
fn parse_scaled(value: &str, scale: u32) -> Option<i64> {
    let parsed: Decimal = value.parse().ok()?;
    (parsed * Decimal::from(10u64.pow(scale))).trunc().to_i64()
}

/// Rescale a signed coin-unit amount to a fixed-point i128.
fn rescale_i128(value: Decimal, scale: u32) -> Option<i128> {
    (value * Decimal::from(10u64.pow(scale))).trunc().to_i128()
}

#[async_trait]
impl ChainClient for HyperliquidClient {
    async fn fetch_spot_positions(
        &self,
        wallet: &WalletAddress,
        sub_account: u16,
    ) -> ChainResult<Vec<RawSpotPosition>> {
        // Hyperliquid exposes one cross-margin account per address.
        if sub_account != 0 {
            return Ok(Vec::new());
        }
        let state = self.fetch_user_state(wallet).await?;

        // The withdrawable USDC balance is the only spot-like holding;
        // surface it as a quote-market deposit at the balance scale.
        let Some(withdrawable) = state.withdrawable.as_deref() else {
            return Ok(Vec::new());
        };
        let amount: Decimal = withdrawable
            .parse()
            .map_err(|e| ChainError::Decode(format!("withdrawable: {e}")))?;
        let scaled = rescale_i128(amount, folio_core::SPOT_BALANCE_SCALE)
            .filter(|v| *v > 0)
            .map(|v| v as u128);
        Ok(scaled
            .map(|scaled_balance| {
                vec![RawSpotPosition {
                    market_index: 0,
                    scaled_balance,
                    balance_kind: folio_core::BalanceKind::Deposit,
                }]
            })
            .unwrap_or_default())
    }

    async fn fetch_perp_positions(
        &self,
        wallet: &WalletAddress,
        sub_account: u16,
    ) -> ChainResult<Vec<RawPerpPosition>> {
        if sub_account != 0 {
            return Ok(Vec::new());
        }
        self.ensure_universe().await?;
        let state = self.fetch_user_state(wallet).await?;

        let mut positions = Vec::with_capacity(state.asset_positions.len());
        for entry in &state.asset_positions {
            let dto = &entry.position;
            let Some(market_index) = self.coin_index.get(&dto.coin).map(|i| *i) else {
                warn!(coin = %dto.coin, "position in unknown coin, skipping");
                continue;
            };
            let szi: Decimal = dto
                .szi
                .parse()
                .map_err(|e| ChainError::Decode(format!("szi: {e}")))?;
            let entry_px: Decimal = match dto.entry_px.as_deref() {
                Some(px) => px
                    .parse()
                    .map_err(|e| ChainError::Decode(format!("entryPx: {e}")))?,
                None => Decimal::ZERO,
            };

            let base_asset_amount = rescale_i128(szi, BASE_SCALE).unwrap_or(0);
            // Quote entry carries the opposite sign of the base amount,
            // matching the on-chain convention the calculators expect.
            let quote_entry_amount =
                rescale_i128(-(szi * entry_px), PRICE_SCALE).unwrap_or(0);

            positions.push(RawPerpPosition {
                market_index,
                base_asset_amount,
                quote_entry_amount,
            });
        }
        Ok(positions)
    }

    async fn fetch_oracle_price(
        &self,
        market_index: u16,
        kind: MarketKind,
    ) -> ChainResult<Option<OraclePrice>> {
        // No spot oracle on the perp-only venue; USDC values 1:1.
        if kind == MarketKind::Spot {
            return Ok(None);
        }
        self.ensure_universe().await?;
        Ok(self
            .ctxs
            .get(&market_index)
            .and_then(|ctx| ctx.oracle_price)
            .map(|price| OraclePrice::new(market_index, price)))
    }

    async fn fetch_spot_market_interest(
        &self,
        _market_index: u16,
    ) -> ChainResult<Option<SpotInterest>> {
        // Balances are plain USDC, no interest index.
        Ok(None)
    }

    async fn fetch_perp_market_funding(&self, market_index: u16) -> ChainResult<Option<i64>> {
        self.ensure_universe().await?;
        Ok(self.ctxs.get(&market_index).and_then(|ctx| ctx.funding_rate))
    }

    async fn fetch_market_metadata(
        &self,
        market_index: u16,
        kind: MarketKind,
    ) -> ChainResult<Option<MarketMetadata>> {
        if kind == MarketKind::Spot {
            return Ok(None);
        }
        self.ensure_universe().await?;
        Ok(self.index_coin.get(&market_index).map(|coin| MarketMetadata {
            market_index,
            symbol: format!("{}-PERP", coin.value()),
            base_decimals: BASE_SCALE,
            quote_decimals: PRICE_SCALE,
        }))
    }

    async fn list_subaccounts(
        &self,
        _wallet: &WalletAddress,
        max_id: u16,
    ) -> ChainResult<Vec<SubaccountProbe>> {
        // One cross-margin account per address; probe ids beyond 0 never
        // exist but are still reported so callers see the full range.
        Ok((0..=max_id)
            .map(|id| SubaccountProbe {
                id,
                exists: id == 0,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_scaled_price() {
        assert_eq!(parse_scaled("142.5", PRICE_SCALE), Some(142_500_000));
        assert_eq!(parse_scaled("0.0000125", FUNDING_SCALE), Some(12_500));
        assert_eq!(parse_scaled("garbage", PRICE_SCALE), None);
    }

    #[test]
    fn test_rescale_signed_size() {
        assert_eq!(rescale_i128(dec!(-2.5), BASE_SCALE), Some(-2_500_000_000));
        assert_eq!(rescale_i128(dec!(0.001), BASE_SCALE), Some(1_000_000));
    }

    #[test]
    fn test_user_state_parsing() {
        let json = r#"{
            "assetPositions": [
                {"position": {"coin": "SOL", "szi": "2.0", "entryPx": "100.0"}},
                {"position": {"coin": "ETH", "szi": "-0.5", "entryPx": "3000.0"}}
            ],
            "withdrawable": "1250.75"
        }"#;
        let state: UserStateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(state.asset_positions.len(), 2);
        assert_eq!(state.asset_positions[0].position.coin, "SOL");
        assert_eq!(state.withdrawable.as_deref(), Some("1250.75"));
    }

    #[test]
    fn test_user_state_defaults_when_empty() {
        let state: UserStateResponse = serde_json::from_str("{}").unwrap();
        assert!(state.asset_positions.is_empty());
        assert!(state.withdrawable.is_none());
    }

    #[test]
    fn test_info_request_serialization() {
        let request = InfoRequest {
            request_type: "metaAndAssetCtxs".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"type":"metaAndAssetCtxs"}"#
        );

        let request = UserInfoRequest {
            request_type: "clearinghouseState".to_string(),
            user: "0xabc".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"type":"clearinghouseState","user":"0xabc"}"#
        );
    }
}

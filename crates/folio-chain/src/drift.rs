//! Drift protocol client over its data REST API.
//!
//! Fetches user sub-accounts and per-market state as JSON. On-chain
//! amounts arrive as integer strings in the protocol's fixed-point
//! representation and are passed through unscaled; all scaling happens in
//! the calculators. A 404 from a market endpoint is the "datum
//! unavailable" branch (`Ok(None)`), not a fetch failure.

use crate::client::{ChainClient, SubaccountProbe};
use crate::error::{ChainError, ChainResult};
use async_trait::async_trait;
use folio_core::{
    BalanceKind, MarketKind, MarketMetadata, OraclePrice, RawPerpPosition, RawSpotPosition,
    SpotInterest, WalletAddress,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw user sub-accounts response.
#[derive(Debug, Deserialize)]
struct UserAccountsResponse {
    #[serde(rename = "subAccounts", default)]
    sub_accounts: Vec<SubaccountDto>,
}

#[derive(Debug, Deserialize)]
struct SubaccountDto {
    #[serde(rename = "subAccountId")]
    sub_account_id: u16,
    #[serde(rename = "spotPositions", default)]
    spot_positions: Vec<SpotPositionDto>,
    #[serde(rename = "perpPositions", default)]
    perp_positions: Vec<PerpPositionDto>,
}

/// Spot position as served by the data API: integer strings in the
/// on-chain fixed-point representation.
#[derive(Debug, Deserialize)]
struct SpotPositionDto {
    #[serde(rename = "marketIndex")]
    market_index: u16,
    #[serde(rename = "scaledBalance")]
    scaled_balance: String,
    #[serde(rename = "balanceType")]
    balance_type: String,
}

impl SpotPositionDto {
    fn to_raw(&self) -> ChainResult<RawSpotPosition> {
        let scaled_balance = self
            .scaled_balance
            .parse::<u128>()
            .map_err(|e| ChainError::Decode(format!("scaledBalance: {e}")))?;
        let balance_kind = match self.balance_type.to_ascii_lowercase().as_str() {
            "deposit" => BalanceKind::Deposit,
            "borrow" => BalanceKind::Borrow,
            other => {
                return Err(ChainError::Decode(format!("unknown balanceType: {other}")));
            }
        };
        Ok(RawSpotPosition {
            market_index: self.market_index,
            scaled_balance,
            balance_kind,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PerpPositionDto {
    #[serde(rename = "marketIndex")]
    market_index: u16,
    #[serde(rename = "baseAssetAmount")]
    base_asset_amount: String,
    #[serde(rename = "quoteEntryAmount")]
    quote_entry_amount: String,
}

impl PerpPositionDto {
    fn to_raw(&self) -> ChainResult<RawPerpPosition> {
        let base_asset_amount = self
            .base_asset_amount
            .parse::<i128>()
            .map_err(|e| ChainError::Decode(format!("baseAssetAmount: {e}")))?;
        let quote_entry_amount = self
            .quote_entry_amount
            .parse::<i128>()
            .map_err(|e| ChainError::Decode(format!("quoteEntryAmount: {e}")))?;
        Ok(RawPerpPosition {
            market_index: self.market_index,
            base_asset_amount,
            quote_entry_amount,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OracleDto {
    /// Price fixed-point at 1e6, as an integer string.
    price: String,
}

#[derive(Debug, Deserialize)]
struct SpotMarketDto {
    #[serde(rename = "cumulativeDepositInterest")]
    cumulative_deposit_interest: String,
    #[serde(rename = "cumulativeBorrowInterest")]
    cumulative_borrow_interest: String,
}

#[derive(Debug, Deserialize)]
struct PerpMarketDto {
    #[serde(rename = "lastFundingRate")]
    last_funding_rate: String,
}

/// Client for the Drift data REST API.
pub struct DriftClient {
    client: Client,
    base_url: String,
}

impl DriftClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> ChainResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Explicit warm-up: verifies the endpoint answers before the first
    /// account fetch.
    pub async fn ready(&self) -> ChainResult<()> {
        let _: Option<SpotMarketDto> = self.get_json("spotMarketAccounts/0").await?;
        info!(base_url = %self.base_url, "Drift data API reachable");
        Ok(())
    }

    /// GET a JSON document. `Ok(None)` on 404, `Err` on any other
    /// non-success status.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChainResult<Option<T>> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::Http(format!("request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(url = %url, "datum not found");
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Http(format!("HTTP {status}: {body}")));
        }
        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| ChainError::Decode(format!("failed to parse response: {e}")))?;
        Ok(Some(parsed))
    }

    async fn fetch_user_accounts(
        &self,
        wallet: &WalletAddress,
    ) -> ChainResult<Vec<SubaccountDto>> {
        let path = format!("userAccounts?authority={}", wallet.as_str());
        let response: Option<UserAccountsResponse> = self.get_json(&path).await?;
        Ok(response.map(|r| r.sub_accounts).unwrap_or_default())
    }

    fn select_subaccount(
        accounts: Vec<SubaccountDto>,
        sub_account: u16,
    ) -> Option<SubaccountDto> {
        accounts
            .into_iter()
            .find(|a| a.sub_account_id == sub_account)
    }
}

#[async_trait]
impl ChainClient for DriftClient {
    async fn fetch_spot_positions(
        &self,
        wallet: &WalletAddress,
        sub_account: u16,
    ) -> ChainResult<Vec<RawSpotPosition>> {
        let accounts = self.fetch_user_accounts(wallet).await?;
        match Self::select_subaccount(accounts, sub_account) {
            Some(account) => account
                .spot_positions
                .iter()
                .map(SpotPositionDto::to_raw)
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_perp_positions(
        &self,
        wallet: &WalletAddress,
        sub_account: u16,
    ) -> ChainResult<Vec<RawPerpPosition>> {
        let accounts = self.fetch_user_accounts(wallet).await?;
        match Self::select_subaccount(accounts, sub_account) {
            Some(account) => account
                .perp_positions
                .iter()
                .map(PerpPositionDto::to_raw)
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_oracle_price(
        &self,
        market_index: u16,
        kind: MarketKind,
    ) -> ChainResult<Option<OraclePrice>> {
        let path = format!("oracle?marketIndex={market_index}&marketType={kind}");
        let Some(dto) = self.get_json::<OracleDto>(&path).await? else {
            return Ok(None);
        };
        let price = dto
            .price
            .parse::<i64>()
            .map_err(|e| ChainError::Decode(format!("oracle price: {e}")))?;
        Ok(Some(OraclePrice::new(market_index, price)))
    }

    async fn fetch_spot_market_interest(
        &self,
        market_index: u16,
    ) -> ChainResult<Option<SpotInterest>> {
        let path = format!("spotMarketAccounts/{market_index}");
        let Some(dto) = self.get_json::<SpotMarketDto>(&path).await? else {
            return Ok(None);
        };
        let deposit = dto
            .cumulative_deposit_interest
            .parse::<u128>()
            .map_err(|e| ChainError::Decode(format!("cumulativeDepositInterest: {e}")))?;
        let borrow = dto
            .cumulative_borrow_interest
            .parse::<u128>()
            .map_err(|e| ChainError::Decode(format!("cumulativeBorrowInterest: {e}")))?;
        Ok(Some(SpotInterest {
            cumulative_deposit_interest: deposit,
            cumulative_borrow_interest: borrow,
        }))
    }

    async fn fetch_perp_market_funding(&self, market_index: u16) -> ChainResult<Option<i64>> {
        let path = format!("perpMarketAccounts/{market_index}");
        let Some(dto) = self.get_json::<PerpMarketDto>(&path).await? else {
            return Ok(None);
        };
        let rate = dto
            .last_funding_rate
            .parse::<i64>()
            .map_err(|e| ChainError::Decode(format!("lastFundingRate: {e}")))?;
        Ok(Some(rate))
    }

    async fn fetch_market_metadata(
        &self,
        _market_index: u16,
        _kind: MarketKind,
    ) -> ChainResult<Option<MarketMetadata>> {
        // Drift market symbols come from the static registry.
        Ok(None)
    }

    async fn list_subaccounts(
        &self,
        wallet: &WalletAddress,
        max_id: u16,
    ) -> ChainResult<Vec<SubaccountProbe>> {
        let accounts = self.fetch_user_accounts(wallet).await?;
        let probes = (0..=max_id)
            .map(|id| SubaccountProbe {
                id,
                exists: accounts.iter().any(|a| a.sub_account_id == id),
            })
            .collect();
        Ok(probes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_position_dto_to_raw() {
        let dto: SpotPositionDto = serde_json::from_str(
            r#"{"marketIndex":1,"scaledBalance":"5000000000","balanceType":"deposit"}"#,
        )
        .unwrap();
        let raw = dto.to_raw().unwrap();
        assert_eq!(raw.market_index, 1);
        assert_eq!(raw.scaled_balance, 5_000_000_000);
        assert_eq!(raw.balance_kind, BalanceKind::Deposit);
    }

    #[test]
    fn test_spot_position_dto_borrow_case_insensitive() {
        let dto: SpotPositionDto = serde_json::from_str(
            r#"{"marketIndex":0,"scaledBalance":"1","balanceType":"Borrow"}"#,
        )
        .unwrap();
        assert_eq!(dto.to_raw().unwrap().balance_kind, BalanceKind::Borrow);
    }

    #[test]
    fn test_spot_position_dto_rejects_unknown_kind() {
        let dto: SpotPositionDto = serde_json::from_str(
            r#"{"marketIndex":0,"scaledBalance":"1","balanceType":"loan"}"#,
        )
        .unwrap();
        assert!(dto.to_raw().is_err());
    }

    #[test]
    fn test_perp_position_dto_to_raw_preserves_sign() {
        let dto: PerpPositionDto = serde_json::from_str(
            r#"{"marketIndex":0,"baseAssetAmount":"-2000000000","quoteEntryAmount":"200000000"}"#,
        )
        .unwrap();
        let raw = dto.to_raw().unwrap();
        assert_eq!(raw.base_asset_amount, -2_000_000_000);
        assert_eq!(raw.quote_entry_amount, 200_000_000);
        assert!(raw.is_short());
    }

    #[test]
    fn test_user_accounts_response_defaults() {
        let response: UserAccountsResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.sub_accounts.is_empty());

        let response: UserAccountsResponse = serde_json::from_str(
            r#"{"subAccounts":[{"subAccountId":0},{"subAccountId":2}]}"#,
        )
        .unwrap();
        assert_eq!(response.sub_accounts.len(), 2);
        assert!(response.sub_accounts[1].spot_positions.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = DriftClient::new("https://data.example.org/").unwrap();
        assert_eq!(client.base_url, "https://data.example.org");
    }
}

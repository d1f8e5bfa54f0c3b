//! The chain data-source trait.

use crate::error::ChainResult;
use async_trait::async_trait;
use folio_core::{
    MarketKind, MarketMetadata, OraclePrice, RawPerpPosition, RawSpotPosition, SpotInterest,
    WalletAddress,
};
use serde::{Deserialize, Serialize};

/// Result of probing one sub-account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountProbe {
    pub id: u16,
    pub exists: bool,
}

/// Read-only access to one protocol's account and market state.
///
/// Implementations are explicitly constructed and injected into the
/// pipeline; there is no ambient global client. `Ok(None)` from the
/// market-data methods means "fetched fine, datum unavailable" — callers
/// pass that through to the calculators as the degrade-to-zero branch.
#[mockall::automock]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// All spot holdings of one sub-account.
    async fn fetch_spot_positions(
        &self,
        wallet: &WalletAddress,
        sub_account: u16,
    ) -> ChainResult<Vec<RawSpotPosition>>;

    /// All perp position slots of one sub-account (may include zero-base
    /// slots; the calculators filter those).
    async fn fetch_perp_positions(
        &self,
        wallet: &WalletAddress,
        sub_account: u16,
    ) -> ChainResult<Vec<RawPerpPosition>>;

    /// Current oracle price for one market.
    async fn fetch_oracle_price(
        &self,
        market_index: u16,
        kind: MarketKind,
    ) -> ChainResult<Option<OraclePrice>>;

    /// Cumulative deposit/borrow interest for one spot market.
    async fn fetch_spot_market_interest(
        &self,
        market_index: u16,
    ) -> ChainResult<Option<SpotInterest>>;

    /// Last funding rate for one perp market, fixed-point at 1e9.
    async fn fetch_perp_market_funding(&self, market_index: u16) -> ChainResult<Option<i64>>;

    /// Exchange-provided metadata for one market, when the protocol
    /// carries its own symbol table. `None` defers to the static registry.
    async fn fetch_market_metadata(
        &self,
        market_index: u16,
        kind: MarketKind,
    ) -> ChainResult<Option<MarketMetadata>>;

    /// Probe sub-account ids `0..=max_id` for existence.
    async fn list_subaccounts(
        &self,
        wallet: &WalletAddress,
        max_id: u16,
    ) -> ChainResult<Vec<SubaccountProbe>>;
}

//! Portfolio service: per-wallet fetch, compute, and cross-wallet summary.

use crate::error::PortfolioResult;
use crate::snapshot::AccountSnapshot;
use chrono::Utc;
use folio_chain::{ChainClient, ChainResult};
use folio_core::{Chain, MarketKind, MarketRegistry, RawPerpPosition, RawSpotPosition, WalletAddress};
use folio_metrics::{
    compute_balances, compute_equity, compute_positions, compute_summary, PerpMarketState,
    PortfolioSummary, SpotMarketState,
};
use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Orchestrates fetching raw account state and deriving metrics from it.
///
/// Holds explicitly injected chain clients, one per chain family, and
/// routes each wallet by its address shape. The service itself keeps no
/// state between calls; every summary is computed from a fresh fetch.
pub struct PortfolioService {
    drift: Arc<dyn ChainClient>,
    hyperliquid: Arc<dyn ChainClient>,
    max_subaccounts: u16,
}

impl PortfolioService {
    pub fn new(
        drift: Arc<dyn ChainClient>,
        hyperliquid: Arc<dyn ChainClient>,
        max_subaccounts: u16,
    ) -> Self {
        Self {
            drift,
            hyperliquid,
            max_subaccounts,
        }
    }

    fn client_for(&self, chain: Chain) -> &dyn ChainClient {
        match chain {
            Chain::Solana => self.drift.as_ref(),
            Chain::Evm => self.hyperliquid.as_ref(),
        }
    }

    /// Resolve one wallet across all of its sub-accounts into a single
    /// derived snapshot. Raw state from every existing sub-account is
    /// combined before the calculators run, so the wallet's equity and
    /// health reflect the whole account set.
    pub async fn wallet_snapshot(&self, wallet: &WalletAddress) -> PortfolioResult<AccountSnapshot> {
        let client = self.client_for(wallet.chain());

        let mut spot_raw: Vec<RawSpotPosition> = Vec::new();
        let mut perp_raw: Vec<RawPerpPosition> = Vec::new();
        for probe in client.list_subaccounts(wallet, self.max_subaccounts).await? {
            if !probe.exists {
                continue;
            }
            spot_raw.extend(client.fetch_spot_positions(wallet, probe.id).await?);
            perp_raw.extend(client.fetch_perp_positions(wallet, probe.id).await?);
        }
        debug!(
            wallet = %wallet,
            spot_slots = spot_raw.len(),
            perp_slots = perp_raw.len(),
            "raw account state fetched"
        );

        let spot_states = self.spot_states(client, &spot_raw).await?;
        let perp_states = self.perp_states(client, &perp_raw).await?;

        let balances = compute_balances(&spot_raw, &spot_states);
        let positions = compute_positions(&perp_raw, &perp_states);
        let equity = compute_equity(&balances, &perp_raw, &perp_states);

        Ok(AccountSnapshot {
            wallet: wallet.to_string(),
            equity,
            balances,
            positions,
            as_of: Utc::now(),
        })
    }

    /// Summarize a caller-supplied wallet list.
    ///
    /// Addresses are validated up front; a malformed address is an input
    /// error, not a partial failure. Valid wallets are fetched
    /// concurrently and a fetch failure is isolated to its wallet: the
    /// summary carries the other wallets' contributions plus the failed
    /// wallet identifiers.
    pub async fn summarize(&self, wallets: &[String]) -> PortfolioResult<PortfolioSummary> {
        let parsed = wallets
            .iter()
            .map(|w| WalletAddress::parse(w))
            .collect::<Result<Vec<_>, _>>()?;

        let snapshots = join_all(parsed.iter().map(|w| self.wallet_snapshot(w))).await;

        let mut accounts = Vec::new();
        let mut failed = Vec::new();
        for (wallet, result) in parsed.iter().zip(snapshots) {
            match result {
                Ok(snapshot) => accounts.push(snapshot.to_wallet_account()),
                Err(err) => {
                    warn!(wallet = %wallet, error = %err, "wallet fetch failed, excluding from totals");
                    failed.push(wallet.to_string());
                }
            }
        }

        Ok(compute_summary(&accounts, failed))
    }

    /// Fetch per-market state for every spot market the raw positions
    /// reference. Unavailable data stays `None`; the calculators own the
    /// fallback semantics.
    async fn spot_states(
        &self,
        client: &dyn ChainClient,
        raw: &[RawSpotPosition],
    ) -> ChainResult<HashMap<u16, SpotMarketState>> {
        let registry = MarketRegistry::new();
        let indices: HashSet<u16> = raw.iter().map(|p| p.market_index).collect();

        let mut states = HashMap::with_capacity(indices.len());
        for market_index in indices {
            let interest = client.fetch_spot_market_interest(market_index).await?;
            let oracle = client
                .fetch_oracle_price(market_index, MarketKind::Spot)
                .await?;
            let metadata = client
                .fetch_market_metadata(market_index, MarketKind::Spot)
                .await?
                .unwrap_or_else(|| registry.resolve(MarketKind::Spot, market_index));
            states.insert(
                market_index,
                SpotMarketState {
                    metadata,
                    interest,
                    oracle,
                },
            );
        }
        Ok(states)
    }

    /// Fetch per-market state for every perp market the raw positions
    /// reference. Only open slots matter; empty ones are skipped.
    async fn perp_states(
        &self,
        client: &dyn ChainClient,
        raw: &[RawPerpPosition],
    ) -> ChainResult<HashMap<u16, PerpMarketState>> {
        let registry = MarketRegistry::new();
        let indices: HashSet<u16> = raw
            .iter()
            .filter(|p| p.is_open())
            .map(|p| p.market_index)
            .collect();

        let mut states = HashMap::with_capacity(indices.len());
        for market_index in indices {
            let oracle = client
                .fetch_oracle_price(market_index, MarketKind::Perp)
                .await?;
            let last_funding_rate = client.fetch_perp_market_funding(market_index).await?;
            let metadata = client
                .fetch_market_metadata(market_index, MarketKind::Perp)
                .await?
                .unwrap_or_else(|| registry.resolve(MarketKind::Perp, market_index));
            states.insert(
                market_index,
                PerpMarketState {
                    metadata,
                    oracle,
                    last_funding_rate,
                },
            );
        }
        Ok(states)
    }
}

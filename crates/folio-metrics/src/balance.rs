//! Per-asset balance derivation for interest-bearing spot holdings.
//!
//! A scaled balance only becomes a real token amount after multiplying by
//! the market's cumulative interest index. Dust left over from interest
//! rounding is filtered out, and the surviving entries are ordered for
//! display: quote asset first, then descending USD value. Callers rely on
//! that ordering.

use crate::position::unsigned_scaled;
use folio_core::{
    MarketKind, MarketMetadata, MarketRegistry, OraclePrice, RawSpotPosition, SpotInterest,
    SPOT_BALANCE_SCALE,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Balances at or below this token amount are dropped as dust.
fn dust_threshold() -> Decimal {
    // 1e-6
    Decimal::new(1, 6)
}

/// Per-market inputs for balance derivation. `None` fields mean the
/// lookup failed and the documented defaults apply.
#[derive(Debug, Clone)]
pub struct SpotMarketState {
    pub metadata: MarketMetadata,
    pub interest: Option<SpotInterest>,
    pub oracle: Option<OraclePrice>,
}

impl SpotMarketState {
    /// State for a market nothing was fetched for.
    pub fn unavailable(market_index: u16) -> Self {
        Self {
            metadata: MarketRegistry::new().resolve(MarketKind::Spot, market_index),
            interest: None,
            oracle: None,
        }
    }
}

/// One asset holding with interest applied and a USD valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBalance {
    pub asset: String,
    pub amount: Decimal,
    pub value_usd: Decimal,
}

/// Derive one balance entry. Returns `None` for empty slots and for
/// dust-level amounts.
fn compute_balance(raw: &RawSpotPosition, state: &SpotMarketState) -> Option<DerivedBalance> {
    if raw.is_empty() {
        return None;
    }

    // Missing interest data defaults to the neutral index (rate 1.0).
    let rate = state
        .interest
        .unwrap_or_default()
        .rate(raw.balance_kind);
    let amount = unsigned_scaled(raw.scaled_balance, SPOT_BALANCE_SCALE) * rate;
    if amount <= dust_threshold() {
        return None;
    }

    // Quote market values 1:1; otherwise use the oracle, assuming a
    // roughly-stable price when the oracle is unavailable.
    let value_usd = if MarketRegistry::new().is_quote_market(raw.market_index) {
        amount
    } else {
        match state.oracle.map(|o| o.to_usd()) {
            Some(price) if price > Decimal::ZERO => amount * price,
            _ => amount,
        }
    };

    Some(DerivedBalance {
        asset: state.metadata.symbol.clone(),
        amount,
        value_usd,
    })
}

/// Derive balances for a batch of raw spot positions.
///
/// Output ordering is a presentation contract: the quote asset (market
/// index 0) comes first, remaining assets sorted by descending USD value.
pub fn compute_balances(
    raw_positions: &[RawSpotPosition],
    states: &HashMap<u16, SpotMarketState>,
) -> Vec<DerivedBalance> {
    let registry = MarketRegistry::new();
    let mut quote = Vec::new();
    let mut rest = Vec::new();

    for raw in raw_positions {
        let fallback;
        let state = match states.get(&raw.market_index) {
            Some(state) => state,
            None => {
                trace!(market_index = raw.market_index, "no spot market state, using defaults");
                fallback = SpotMarketState::unavailable(raw.market_index);
                &fallback
            }
        };
        if let Some(balance) = compute_balance(raw, state) {
            if registry.is_quote_market(raw.market_index) {
                quote.push(balance);
            } else {
                rest.push(balance);
            }
        }
    }

    rest.sort_by(|a, b| b.value_usd.cmp(&a.value_usd));
    quote.extend(rest);
    quote
}

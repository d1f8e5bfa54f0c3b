//! One account's combined equity, collateral and health.
//!
//! Reduces a full set of derived balances plus raw perp positions into
//! the account-level figures. Position PnL is recomputed here through the
//! same [`PositionFigures`] arithmetic the position calculator uses, so
//! the two views can never disagree.

use crate::balance::DerivedBalance;
use crate::position::{PerpMarketState, PositionFigures, MAINTENANCE_MARGIN_RATIO};
use folio_core::RawPerpPosition;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Account-level aggregate over all balances and open positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEquity {
    pub total_equity: Decimal,
    /// Equity not allocated as margin; never negative.
    pub free_collateral: Decimal,
    pub margin_used: Decimal,
    pub unrealized_pnl: Decimal,
    /// Distance from liquidation, 0 (liquidatable) to 100 (fully healthy).
    pub account_health: Decimal,
    pub leverage: Decimal,
}

impl AccountEquity {
    /// The all-zero account: no balances, no positions, fully healthy.
    pub fn empty() -> Self {
        Self {
            total_equity: Decimal::ZERO,
            free_collateral: Decimal::ZERO,
            margin_used: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            account_health: dec!(100),
            leverage: Decimal::ZERO,
        }
    }
}

/// Aggregate one account's derived balances and raw perp positions.
///
/// Missing market state degrades the affected position's contribution to
/// zero, same as the position calculator.
pub fn compute_equity(
    balances: &[DerivedBalance],
    positions: &[RawPerpPosition],
    states: &HashMap<u16, PerpMarketState>,
) -> AccountEquity {
    let spot_value: Decimal = balances.iter().map(|b| b.value_usd).sum();

    let mut unrealized_pnl = Decimal::ZERO;
    let mut total_notional = Decimal::ZERO;
    let mut margin_used = Decimal::ZERO;

    for raw in positions {
        let fallback;
        let state = match states.get(&raw.market_index) {
            Some(state) => state,
            None => {
                fallback = PerpMarketState::unavailable(raw.market_index);
                &fallback
            }
        };
        if let Some(figures) = PositionFigures::from_raw(raw, state) {
            unrealized_pnl += figures.unrealized_pnl;
            total_notional += figures.notional_usd;
            margin_used += figures.margin();
        }
    }

    let total_equity = spot_value + unrealized_pnl;
    let free_collateral = (total_equity - margin_used).max(Decimal::ZERO);

    let leverage = if total_equity > Decimal::ZERO {
        total_notional / total_equity
    } else {
        Decimal::ZERO
    };

    // No margin in use means nothing can be liquidated: fully healthy.
    let mut account_health = dec!(100);
    if margin_used > Decimal::ZERO {
        let maintenance_margin = total_notional * MAINTENANCE_MARGIN_RATIO;
        let buffer = margin_used - maintenance_margin;
        if buffer > Decimal::ZERO {
            let ratio = (total_equity - maintenance_margin) / buffer * dec!(100);
            account_health = ratio.clamp(Decimal::ZERO, dec!(100));
        }
    }

    AccountEquity {
        total_equity,
        free_collateral,
        margin_used,
        unrealized_pnl,
        account_health,
        leverage,
    }
}

//! Per-position derived metrics for perpetual futures.
//!
//! Takes raw on-chain perp records plus per-market state (metadata, oracle
//! price, last funding rate) and produces the display-ready metrics. All
//! divisions are positivity-guarded; a missing oracle degrades mark-price
//! dependent fields to zero rather than failing the batch.
//!
//! Margin model: a flat 10% initial margin and flat 3% maintenance margin
//! across all markets. This is an approximation of the protocol's tiered
//! per-market requirements, so `leverage` collapses to a constant 10x for
//! any open position and `liquidation_price` is indicative only, not an
//! execution-grade number.

use folio_core::{
    decimal_from_scaled, MarketKind, MarketMetadata, MarketRegistry, OraclePrice,
    RawPerpPosition, FUNDING_RATE_SCALE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Flat initial margin requirement (10% of notional).
pub(crate) const INITIAL_MARGIN_RATIO: Decimal = dec!(0.10);

/// Flat maintenance margin requirement (3% of notional).
pub(crate) const MAINTENANCE_MARGIN_RATIO: Decimal = dec!(0.03);

/// Magnitude of a fixed-point amount as a non-negative `Decimal`.
/// Values too large for the mantissa collapse to zero (corrupt state).
pub(crate) fn unsigned_scaled(value: u128, scale: u32) -> Decimal {
    i128::try_from(value)
        .ok()
        .and_then(|v| decimal_from_scaled(v, scale))
        .unwrap_or(Decimal::ZERO)
}

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Per-market inputs for position derivation.
///
/// `oracle` and `last_funding_rate` are `None` when the lookup failed;
/// the calculators treat that as the documented degrade-to-zero branch.
#[derive(Debug, Clone)]
pub struct PerpMarketState {
    pub metadata: MarketMetadata,
    pub oracle: Option<OraclePrice>,
    /// Last funding rate, fixed-point at 1e9.
    pub last_funding_rate: Option<i64>,
}

impl PerpMarketState {
    /// State for a market nothing was fetched for: synthesized metadata,
    /// no oracle, no funding.
    pub fn unavailable(market_index: u16) -> Self {
        Self {
            metadata: MarketRegistry::new().resolve(MarketKind::Perp, market_index),
            oracle: None,
            last_funding_rate: None,
        }
    }
}

/// Display-ready metrics for one open perp position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedPosition {
    pub market: String,
    pub direction: Direction,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    pub notional_usd: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percent: Decimal,
    pub margin: Decimal,
    pub leverage: Decimal,
    pub liquidation_price: Decimal,
    /// Last funding rate in percent.
    pub funding_rate: Decimal,
}

/// Core per-position figures shared between the position calculator and
/// the equity aggregator, so both derive PnL from identical arithmetic.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PositionFigures {
    pub direction: Direction,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    pub notional_usd: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percent: Decimal,
}

impl PositionFigures {
    /// Compute the base figures for one open position. Returns `None`
    /// for a zero base amount (no position).
    pub fn from_raw(raw: &RawPerpPosition, state: &PerpMarketState) -> Option<Self> {
        if !raw.is_open() {
            return None;
        }
        let direction = if raw.is_long() {
            Direction::Long
        } else {
            Direction::Short
        };

        let size = unsigned_scaled(raw.base_asset_amount.unsigned_abs(), state.metadata.base_decimals);

        // |quote_entry / base| * 10^(base_dec - quote_dec), expressed as
        // quote-in-USD divided by size so no intermediate exceeds the
        // mantissa. Guarded even though zero-size slots were filtered.
        let quote_entry =
            unsigned_scaled(raw.quote_entry_amount.unsigned_abs(), state.metadata.quote_decimals);
        let entry_price = if size > Decimal::ZERO {
            quote_entry / size
        } else {
            Decimal::ZERO
        };

        let mark_price = state.oracle.map(|o| o.to_usd()).unwrap_or(Decimal::ZERO);
        let notional_usd = size * mark_price;

        let priced = mark_price > Decimal::ZERO && entry_price > Decimal::ZERO && size > Decimal::ZERO;
        let (unrealized_pnl, pnl_percent) = if priced {
            match direction {
                Direction::Long => (
                    size * (mark_price - entry_price),
                    (mark_price / entry_price - Decimal::ONE) * dec!(100),
                ),
                Direction::Short => (
                    size * (entry_price - mark_price),
                    (entry_price / mark_price - Decimal::ONE) * dec!(100),
                ),
            }
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        Some(Self {
            direction,
            size,
            entry_price,
            mark_price,
            notional_usd,
            unrealized_pnl,
            pnl_percent,
        })
    }

    pub fn margin(&self) -> Decimal {
        self.notional_usd * INITIAL_MARGIN_RATIO
    }

    pub fn maintenance_margin(&self) -> Decimal {
        self.notional_usd * MAINTENANCE_MARGIN_RATIO
    }
}

/// Derive one position's metrics. Returns `None` for empty slots.
pub fn compute_position(
    raw: &RawPerpPosition,
    state: &PerpMarketState,
) -> Option<DerivedPosition> {
    let figures = PositionFigures::from_raw(raw, state)?;

    let margin = figures.margin();
    let leverage = if margin > Decimal::ZERO {
        figures.notional_usd / margin
    } else {
        Decimal::ZERO
    };

    let liquidation_price = if figures.entry_price > Decimal::ZERO
        && figures.notional_usd > Decimal::ZERO
    {
        let buffer = (margin - figures.maintenance_margin()) / figures.notional_usd;
        match figures.direction {
            Direction::Long => figures.entry_price * (Decimal::ONE - buffer),
            Direction::Short => figures.entry_price * (Decimal::ONE + buffer),
        }
    } else {
        Decimal::ZERO
    };

    let funding_rate = state
        .last_funding_rate
        .and_then(|rate| decimal_from_scaled(rate as i128, FUNDING_RATE_SCALE))
        .map(|rate| rate * dec!(100))
        .unwrap_or(Decimal::ZERO);

    Some(DerivedPosition {
        market: state.metadata.symbol.clone(),
        direction: figures.direction,
        size: figures.size,
        entry_price: figures.entry_price,
        mark_price: figures.mark_price,
        notional_usd: figures.notional_usd,
        unrealized_pnl: figures.unrealized_pnl,
        pnl_percent: figures.pnl_percent,
        margin,
        leverage,
        liquidation_price,
        funding_rate,
    })
}

/// Derive metrics for a batch of raw positions.
///
/// Empty slots (zero base amount) are skipped. Markets missing from
/// `states` fall back to synthesized metadata with no oracle, so the
/// output degrades to zeros instead of dropping the position.
pub fn compute_positions(
    raw_positions: &[RawPerpPosition],
    states: &HashMap<u16, PerpMarketState>,
) -> Vec<DerivedPosition> {
    raw_positions
        .iter()
        .filter_map(|raw| {
            let fallback;
            let state = match states.get(&raw.market_index) {
                Some(state) => state,
                None => {
                    trace!(market_index = raw.market_index, "no perp market state, using defaults");
                    fallback = PerpMarketState::unavailable(raw.market_index);
                    &fallback
                }
            };
            compute_position(raw, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::MarketMetadata;

    fn sol_perp_state(oracle_price: Option<i64>, funding: Option<i64>) -> PerpMarketState {
        PerpMarketState {
            metadata: MarketMetadata {
                market_index: 0,
                symbol: "SOL-PERP".to_string(),
                base_decimals: 9,
                quote_decimals: 6,
            },
            oracle: oracle_price.map(|p| OraclePrice::new(0, p)),
            last_funding_rate: funding,
        }
    }

    fn raw(base: i128, quote: i128) -> RawPerpPosition {
        RawPerpPosition {
            market_index: 0,
            base_asset_amount: base,
            quote_entry_amount: quote,
        }
    }

    #[test]
    fn test_zero_base_amount_emits_nothing() {
        let state = sol_perp_state(Some(100_000_000), None);
        assert!(compute_position(&raw(0, 5_000_000), &state).is_none());
        assert!(compute_positions(&[raw(0, 0)], &HashMap::new()).is_empty());
    }

    #[test]
    fn test_long_position_scenario() {
        // size=2, entry=100, mark=110
        let state = sol_perp_state(Some(110_000_000), None);
        let pos = compute_position(&raw(2_000_000_000, -200_000_000), &state).unwrap();

        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.size, dec!(2));
        assert_eq!(pos.entry_price, dec!(100));
        assert_eq!(pos.mark_price, dec!(110));
        assert_eq!(pos.notional_usd, dec!(220));
        assert_eq!(pos.unrealized_pnl, dec!(20));
        assert_eq!(pos.pnl_percent, dec!(10));
    }

    #[test]
    fn test_short_position_scenario() {
        // size=1, entry=50, mark=40
        let state = sol_perp_state(Some(40_000_000), None);
        let pos = compute_position(&raw(-1_000_000_000, 50_000_000), &state).unwrap();

        assert_eq!(pos.direction, Direction::Short);
        assert_eq!(pos.size, dec!(1));
        assert_eq!(pos.entry_price, dec!(50));
        assert_eq!(pos.unrealized_pnl, dec!(10));
        // (entry/mark - 1) * 100 = (50/40 - 1) * 100
        assert_eq!(pos.pnl_percent, dec!(25));
    }

    #[test]
    fn test_missing_oracle_degrades_to_zero() {
        let state = sol_perp_state(None, None);
        let pos = compute_position(&raw(2_000_000_000, -200_000_000), &state).unwrap();

        assert_eq!(pos.entry_price, dec!(100));
        assert_eq!(pos.mark_price, Decimal::ZERO);
        assert_eq!(pos.notional_usd, Decimal::ZERO);
        assert_eq!(pos.unrealized_pnl, Decimal::ZERO);
        assert_eq!(pos.pnl_percent, Decimal::ZERO);
        assert_eq!(pos.margin, Decimal::ZERO);
        assert_eq!(pos.leverage, Decimal::ZERO);
        assert_eq!(pos.liquidation_price, Decimal::ZERO);
    }

    #[test]
    fn test_flat_margin_model() {
        let state = sol_perp_state(Some(110_000_000), None);
        let pos = compute_position(&raw(2_000_000_000, -200_000_000), &state).unwrap();

        // margin = 10% of notional, so leverage is the constant 10x.
        assert_eq!(pos.margin, dec!(22));
        assert_eq!(pos.leverage, dec!(10));
        // (margin - maintenance) / notional = 7%, long liq below entry.
        assert_eq!(pos.liquidation_price, dec!(93));
    }

    #[test]
    fn test_short_liquidation_above_entry() {
        let state = sol_perp_state(Some(40_000_000), None);
        let pos = compute_position(&raw(-1_000_000_000, 50_000_000), &state).unwrap();
        assert!(pos.liquidation_price > pos.entry_price);
        assert_eq!(pos.liquidation_price, dec!(53.5));
    }

    #[test]
    fn test_funding_rate_percent() {
        // 1e9-scaled 0.0001 -> 0.01%
        let state = sol_perp_state(Some(100_000_000), Some(100_000));
        let pos = compute_position(&raw(1_000_000_000, -100_000_000), &state).unwrap();
        assert_eq!(pos.funding_rate, dec!(0.01));

        let no_funding = sol_perp_state(Some(100_000_000), None);
        let pos = compute_position(&raw(1_000_000_000, -100_000_000), &no_funding).unwrap();
        assert_eq!(pos.funding_rate, Decimal::ZERO);
    }

    #[test]
    fn test_pnl_sign_matches_direction() {
        // Long profits when mark > entry.
        let up = sol_perp_state(Some(120_000_000), None);
        let down = sol_perp_state(Some(80_000_000), None);
        let long = raw(1_000_000_000, -100_000_000);
        let short = raw(-1_000_000_000, 100_000_000);

        assert!(compute_position(&long, &up).unwrap().unrealized_pnl > Decimal::ZERO);
        assert!(compute_position(&long, &down).unwrap().unrealized_pnl < Decimal::ZERO);
        assert!(compute_position(&short, &up).unwrap().unrealized_pnl < Decimal::ZERO);
        assert!(compute_position(&short, &down).unwrap().unrealized_pnl > Decimal::ZERO);
    }

    #[test]
    fn test_unknown_market_uses_synthesized_metadata() {
        let raw = RawPerpPosition {
            market_index: 512,
            base_asset_amount: 100_000_000, // 1.0 at the default 8 decimals
            quote_entry_amount: -42_000_000,
        };
        let derived = compute_positions(&[raw], &HashMap::new());
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].market, "PERP-512");
        assert_eq!(derived[0].size, dec!(1));
        assert_eq!(derived[0].entry_price, dec!(42));
        assert_eq!(derived[0].mark_price, Decimal::ZERO);
    }

    #[test]
    fn test_idempotent_computation() {
        let state = sol_perp_state(Some(110_000_000), Some(100_000));
        let position = raw(2_000_000_000, -200_000_000);
        let first = compute_position(&position, &state).unwrap();
        let second = compute_position(&position, &state).unwrap();
        assert_eq!(first, second);
    }
}

//! Raw on-chain record types and fixed-point scale constants.
//!
//! These are snapshots of protocol account state as returned by a chain
//! client, before any derivation. Integer amounts stay in the protocol's
//! fixed-point representation; conversion to `Decimal` happens through the
//! helpers here so every consumer scales them the same way.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scale (decimal places) of a spot scaled balance. Drift's
/// SPOT_BALANCE_PRECISION is 1e9.
pub const SPOT_BALANCE_SCALE: u32 = 9;

/// Scale of cumulative deposit/borrow interest. Drift's
/// SPOT_CUMULATIVE_INTEREST_PRECISION is 1e10.
pub const SPOT_CUMULATIVE_INTEREST_SCALE: u32 = 10;

/// Scale of oracle prices (1e6).
pub const PRICE_SCALE: u32 = 6;

/// Scale of perp funding rates (1e9).
pub const FUNDING_RATE_SCALE: u32 = 9;

/// Which side of the order book a market's state comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Spot,
    Perp,
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
            Self::Perp => write!(f, "perp"),
        }
    }
}

/// Deposit or borrow side of a spot balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceKind {
    Deposit,
    Borrow,
}

/// One asset holding in one sub-account, as stored on-chain.
///
/// `scaled_balance` is in balance units (scale [`SPOT_BALANCE_SCALE`]) and
/// must be multiplied by the market's cumulative interest index to obtain
/// the real token amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpotPosition {
    pub market_index: u16,
    pub scaled_balance: u128,
    pub balance_kind: BalanceKind,
}

impl RawSpotPosition {
    /// A zero scaled balance means the slot is unused.
    pub fn is_empty(&self) -> bool {
        self.scaled_balance == 0
    }
}

/// One open perpetual position, as stored on-chain.
///
/// The sign of `base_asset_amount` encodes direction (positive = long,
/// negative = short). A zero base amount means no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPerpPosition {
    pub market_index: u16,
    pub base_asset_amount: i128,
    pub quote_entry_amount: i128,
}

impl RawPerpPosition {
    /// Check if this slot holds an open position.
    pub fn is_open(&self) -> bool {
        self.base_asset_amount != 0
    }

    /// Check if the position is long (positive base amount).
    pub fn is_long(&self) -> bool {
        self.base_asset_amount > 0
    }

    /// Check if the position is short (negative base amount).
    pub fn is_short(&self) -> bool {
        self.base_asset_amount < 0
    }
}

/// Oracle price for one market, fixed-point at [`PRICE_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub market_index: u16,
    pub price: i64,
}

impl OraclePrice {
    pub fn new(market_index: u16, price: i64) -> Self {
        Self {
            market_index,
            price,
        }
    }

    /// Price as a `Decimal` in USD. Non-positive prices collapse to zero;
    /// a stale or failed oracle must never produce a negative mark.
    pub fn to_usd(&self) -> Decimal {
        if self.price <= 0 {
            return Decimal::ZERO;
        }
        // i64 always fits in Decimal's 96-bit mantissa.
        Decimal::from_i128_with_scale(self.price as i128, PRICE_SCALE)
    }
}

/// Cumulative interest indices for one spot market, fixed-point at
/// [`SPOT_CUMULATIVE_INTEREST_SCALE`]. An index of 1e10 means no interest
/// has accrued (rate 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotInterest {
    pub cumulative_deposit_interest: u128,
    pub cumulative_borrow_interest: u128,
}

impl SpotInterest {
    /// The neutral index: rate 1.0 on both sides.
    pub fn neutral() -> Self {
        let one = 10u128.pow(SPOT_CUMULATIVE_INTEREST_SCALE);
        Self {
            cumulative_deposit_interest: one,
            cumulative_borrow_interest: one,
        }
    }

    /// Interest rate for the given balance side, as a multiplier
    /// (1.0 = no accrual). Falls back to 1.0 when the stored index does
    /// not fit a `Decimal`.
    pub fn rate(&self, kind: BalanceKind) -> Decimal {
        let raw = match kind {
            BalanceKind::Deposit => self.cumulative_deposit_interest,
            BalanceKind::Borrow => self.cumulative_borrow_interest,
        };
        decimal_from_scaled(raw as i128, SPOT_CUMULATIVE_INTEREST_SCALE)
            .unwrap_or(Decimal::ONE)
    }
}

impl Default for SpotInterest {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Convert a fixed-point integer to `Decimal` at the given scale.
///
/// Returns `None` when the value exceeds `Decimal`'s 96-bit mantissa,
/// which for real account state indicates corrupt data rather than a
/// large-but-valid balance.
pub fn decimal_from_scaled(value: i128, scale: u32) -> Option<Decimal> {
    Decimal::try_from_i128_with_scale(value, scale).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_oracle_price_to_usd() {
        let price = OraclePrice::new(1, 142_500_000);
        assert_eq!(price.to_usd(), dec!(142.5));
    }

    #[test]
    fn test_oracle_price_negative_clamps_to_zero() {
        let price = OraclePrice::new(1, -5);
        assert_eq!(price.to_usd(), Decimal::ZERO);
    }

    #[test]
    fn test_perp_position_direction() {
        let long = RawPerpPosition {
            market_index: 0,
            base_asset_amount: 1_000_000_000,
            quote_entry_amount: -100_000_000,
        };
        assert!(long.is_open());
        assert!(long.is_long());
        assert!(!long.is_short());

        let flat = RawPerpPosition {
            market_index: 0,
            base_asset_amount: 0,
            quote_entry_amount: 0,
        };
        assert!(!flat.is_open());
    }

    #[test]
    fn test_interest_rate_scaling() {
        let interest = SpotInterest {
            cumulative_deposit_interest: 10_500_000_000, // 1.05
            cumulative_borrow_interest: 11_000_000_000,  // 1.10
        };
        assert_eq!(interest.rate(BalanceKind::Deposit), dec!(1.05));
        assert_eq!(interest.rate(BalanceKind::Borrow), dec!(1.10));
    }

    #[test]
    fn test_neutral_interest_is_one() {
        let interest = SpotInterest::neutral();
        assert_eq!(interest.rate(BalanceKind::Deposit), dec!(1));
        assert_eq!(interest.rate(BalanceKind::Borrow), dec!(1));
    }

    #[test]
    fn test_decimal_from_scaled() {
        assert_eq!(decimal_from_scaled(1_500_000_000, 9), Some(dec!(1.5)));
        assert_eq!(decimal_from_scaled(100, 9), Some(dec!(0.0000001)));
    }
}

//! Core domain types for the folio crypto position engine.
//!
//! This crate provides the fundamental types shared across the workspace:
//! - Raw on-chain records (`RawSpotPosition`, `RawPerpPosition`) as fetched
//!   from a protocol client, before any derivation
//! - `OraclePrice` and `SpotInterest` fixed-point market state
//! - `MarketRegistry`: market index -> symbol/decimals lookup with a
//!   synthesized fallback for unknown indices
//! - `WalletAddress`: chain-aware address validation

pub mod address;
pub mod error;
pub mod market;
pub mod types;

pub use address::{Chain, WalletAddress};
pub use error::{CoreError, Result};
pub use market::{MarketMetadata, MarketRegistry};
pub use types::{
    decimal_from_scaled, BalanceKind, MarketKind, OraclePrice, RawPerpPosition, RawSpotPosition,
    SpotInterest, FUNDING_RATE_SCALE, PRICE_SCALE, SPOT_BALANCE_SCALE,
    SPOT_CUMULATIVE_INTEREST_SCALE,
};

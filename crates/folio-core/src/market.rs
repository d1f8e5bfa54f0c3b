//! Static market metadata and the index -> metadata registry.
//!
//! The registry is loaded once at process start. Lookups never fail:
//! an index with no entry synthesizes a placeholder symbol with default
//! decimals, so a newly listed market degrades to generic labels instead
//! of aborting a whole account computation.

use crate::types::MarketKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default decimals for an unknown spot token.
const DEFAULT_SPOT_DECIMALS: u32 = 6;

/// Default base decimals for an unknown perp market.
const DEFAULT_PERP_BASE_DECIMALS: u32 = 8;

/// Quote (USD) decimals, shared by all markets.
const QUOTE_DECIMALS: u32 = 6;

/// Symbol and precision for one market index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMetadata {
    pub market_index: u16,
    pub symbol: String,
    pub base_decimals: u32,
    pub quote_decimals: u32,
}

impl MarketMetadata {
    fn known(market_index: u16, symbol: &str, base_decimals: u32) -> Self {
        Self {
            market_index,
            symbol: symbol.to_string(),
            base_decimals,
            quote_decimals: QUOTE_DECIMALS,
        }
    }
}

static SPOT_MARKETS: Lazy<HashMap<u16, MarketMetadata>> = Lazy::new(|| {
    [
        MarketMetadata::known(0, "USDC", 6),
        MarketMetadata::known(1, "SOL", 9),
        MarketMetadata::known(2, "mSOL", 9),
        MarketMetadata::known(3, "wBTC", 8),
        MarketMetadata::known(4, "wETH", 8),
        MarketMetadata::known(5, "USDT", 6),
        MarketMetadata::known(6, "jitoSOL", 9),
        MarketMetadata::known(7, "PYTH", 6),
        MarketMetadata::known(8, "bSOL", 9),
        MarketMetadata::known(9, "JTO", 9),
    ]
    .into_iter()
    .map(|m| (m.market_index, m))
    .collect()
});

static PERP_MARKETS: Lazy<HashMap<u16, MarketMetadata>> = Lazy::new(|| {
    [
        MarketMetadata::known(0, "SOL-PERP", 9),
        MarketMetadata::known(1, "BTC-PERP", 9),
        MarketMetadata::known(2, "ETH-PERP", 9),
        MarketMetadata::known(3, "APT-PERP", 9),
        MarketMetadata::known(4, "1MBONK-PERP", 9),
        MarketMetadata::known(5, "MATIC-PERP", 9),
        MarketMetadata::known(6, "ARB-PERP", 9),
        MarketMetadata::known(7, "DOGE-PERP", 9),
        MarketMetadata::known(8, "BNB-PERP", 9),
        MarketMetadata::known(9, "SUI-PERP", 9),
    ]
    .into_iter()
    .map(|m| (m.market_index, m))
    .collect()
});

/// Read-only lookup from market index to metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketRegistry;

impl MarketRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a market index to metadata, synthesizing a default entry
    /// for unknown indices. Never fails.
    pub fn resolve(&self, kind: MarketKind, market_index: u16) -> MarketMetadata {
        let table = match kind {
            MarketKind::Spot => &SPOT_MARKETS,
            MarketKind::Perp => &PERP_MARKETS,
        };
        table
            .get(&market_index)
            .cloned()
            .unwrap_or_else(|| Self::synthesize(kind, market_index))
    }

    /// Check whether the index is a known quote (USD) market.
    pub fn is_quote_market(&self, market_index: u16) -> bool {
        market_index == 0
    }

    fn synthesize(kind: MarketKind, market_index: u16) -> MarketMetadata {
        let (symbol, base_decimals) = match kind {
            MarketKind::Spot => (format!("TOKEN{market_index}"), DEFAULT_SPOT_DECIMALS),
            MarketKind::Perp => (format!("PERP-{market_index}"), DEFAULT_PERP_BASE_DECIMALS),
        };
        MarketMetadata {
            market_index,
            symbol,
            base_decimals,
            quote_decimals: QUOTE_DECIMALS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_spot_market() {
        let registry = MarketRegistry::new();
        let meta = registry.resolve(MarketKind::Spot, 1);
        assert_eq!(meta.symbol, "SOL");
        assert_eq!(meta.base_decimals, 9);
        assert_eq!(meta.quote_decimals, 6);
    }

    #[test]
    fn test_known_perp_market() {
        let registry = MarketRegistry::new();
        let meta = registry.resolve(MarketKind::Perp, 0);
        assert_eq!(meta.symbol, "SOL-PERP");
        assert_eq!(meta.base_decimals, 9);
    }

    #[test]
    fn test_unknown_spot_synthesizes_default() {
        let registry = MarketRegistry::new();
        let meta = registry.resolve(MarketKind::Spot, 999);
        assert_eq!(meta.symbol, "TOKEN999");
        assert_eq!(meta.base_decimals, 6);
    }

    #[test]
    fn test_unknown_perp_synthesizes_default() {
        let registry = MarketRegistry::new();
        let meta = registry.resolve(MarketKind::Perp, 512);
        assert_eq!(meta.symbol, "PERP-512");
        assert_eq!(meta.base_decimals, 8);
    }

    #[test]
    fn test_quote_market_is_index_zero() {
        let registry = MarketRegistry::new();
        assert!(registry.is_quote_market(0));
        assert!(!registry.is_quote_market(1));
    }
}

//! Portfolio totals across wallets.
//!
//! A straight sum/count reduction over per-account equity and positions.
//! Wallets whose data fetch failed are carried through so the caller can
//! render a partial summary and still say which wallets are missing.

use crate::equity::AccountEquity;
use crate::position::DerivedPosition;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One resolved account's contribution to the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub wallet: String,
    pub equity: AccountEquity,
    pub positions: Vec<DerivedPosition>,
}

/// Per-wallet line in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub wallet: String,
    pub total_equity: Decimal,
    pub unrealized_pnl: Decimal,
    pub open_positions: usize,
}

/// Portfolio-level totals plus per-wallet breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_balance_usd: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub open_positions_count: usize,
    pub wallets: Vec<WalletSummary>,
    /// Wallets whose data fetch failed; their contributions are absent.
    pub failed: Vec<String>,
}

impl PortfolioSummary {
    /// The all-zero summary for an empty wallet list.
    pub fn empty() -> Self {
        Self {
            total_balance_usd: Decimal::ZERO,
            total_unrealized_pnl: Decimal::ZERO,
            open_positions_count: 0,
            wallets: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Reduce resolved accounts into portfolio totals.
///
/// An empty account list yields the all-zero summary. `failed` lists
/// wallets the data layer could not resolve; they contribute nothing but
/// are reported so callers can decide between partial display and retry.
pub fn compute_summary(accounts: &[WalletAccount], failed: Vec<String>) -> PortfolioSummary {
    let mut summary = PortfolioSummary::empty();
    summary.failed = failed;

    for account in accounts {
        summary.total_balance_usd += account.equity.total_equity;
        summary.total_unrealized_pnl += account.equity.unrealized_pnl;
        summary.open_positions_count += account.positions.len();
        summary.wallets.push(WalletSummary {
            wallet: account.wallet.clone(),
            total_equity: account.equity.total_equity,
            unrealized_pnl: account.equity.unrealized_pnl,
            open_positions: account.positions.len(),
        });
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Direction;
    use rust_decimal_macros::dec;

    fn account(wallet: &str, equity: Decimal, pnl: Decimal, positions: usize) -> WalletAccount {
        let position = DerivedPosition {
            market: "SOL-PERP".to_string(),
            direction: Direction::Long,
            size: dec!(1),
            entry_price: dec!(100),
            mark_price: dec!(100),
            notional_usd: dec!(100),
            unrealized_pnl: Decimal::ZERO,
            pnl_percent: Decimal::ZERO,
            margin: dec!(10),
            leverage: dec!(10),
            liquidation_price: dec!(93),
            funding_rate: Decimal::ZERO,
        };
        WalletAccount {
            wallet: wallet.to_string(),
            equity: AccountEquity {
                total_equity: equity,
                free_collateral: equity,
                margin_used: Decimal::ZERO,
                unrealized_pnl: pnl,
                account_health: dec!(100),
                leverage: Decimal::ZERO,
            },
            positions: vec![position; positions],
        }
    }

    #[test]
    fn test_empty_account_list() {
        let summary = compute_summary(&[], Vec::new());
        assert_eq!(summary, PortfolioSummary::empty());
        assert_eq!(summary.total_balance_usd, Decimal::ZERO);
        assert_eq!(summary.open_positions_count, 0);
    }

    #[test]
    fn test_totals_across_wallets() {
        let accounts = [
            account("walletA", dec!(1000), dec!(25), 2),
            account("walletB", dec!(500), dec!(-5), 1),
        ];
        let summary = compute_summary(&accounts, Vec::new());

        assert_eq!(summary.total_balance_usd, dec!(1500));
        assert_eq!(summary.total_unrealized_pnl, dec!(20));
        assert_eq!(summary.open_positions_count, 3);
        assert_eq!(summary.wallets.len(), 2);
        assert_eq!(summary.wallets[0].wallet, "walletA");
        assert_eq!(summary.wallets[1].open_positions, 1);
    }

    #[test]
    fn test_summary_additivity() {
        let a = account("walletA", dec!(1000), dec!(25), 2);
        let b = account("walletB", dec!(500), dec!(-5), 1);

        let combined = compute_summary(&[a.clone(), b.clone()], Vec::new());
        let separate_a = compute_summary(&[a], Vec::new());
        let separate_b = compute_summary(&[b], Vec::new());

        assert_eq!(
            combined.total_balance_usd,
            separate_a.total_balance_usd + separate_b.total_balance_usd
        );
        assert_eq!(
            combined.total_unrealized_pnl,
            separate_a.total_unrealized_pnl + separate_b.total_unrealized_pnl
        );
        assert_eq!(
            combined.open_positions_count,
            separate_a.open_positions_count + separate_b.open_positions_count
        );
    }

    #[test]
    fn test_failed_wallets_reported() {
        let accounts = [account("walletA", dec!(100), Decimal::ZERO, 0)];
        let summary = compute_summary(&accounts, vec!["walletB".to_string()]);

        assert_eq!(summary.total_balance_usd, dec!(100));
        assert_eq!(summary.failed, vec!["walletB".to_string()]);
    }
}

//! Resolved account snapshots.

use chrono::{DateTime, Utc};
use folio_metrics::{AccountEquity, DerivedBalance, DerivedPosition, WalletAccount};
use serde::{Deserialize, Serialize};

/// One wallet's fully derived state at a point in time.
///
/// Recomputed on every query from fresh raw data; never the system of
/// record. `as_of` is the computation time, not a chain timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub wallet: String,
    pub equity: AccountEquity,
    pub balances: Vec<DerivedBalance>,
    pub positions: Vec<DerivedPosition>,
    pub as_of: DateTime<Utc>,
}

impl AccountSnapshot {
    /// This snapshot's contribution to the portfolio summary.
    pub fn to_wallet_account(&self) -> WalletAccount {
        WalletAccount {
            wallet: self.wallet.clone(),
            equity: self.equity.clone(),
            positions: self.positions.clone(),
        }
    }
}

//! Pure derivation of financial metrics from raw on-chain account state.
//!
//! Every function in this crate is a synchronous, side-effect-free
//! computation over already-fetched data:
//! - `position`: per-position metrics (PnL, margin, leverage, liquidation)
//! - `balance`: per-asset accrued amounts and USD values
//! - `equity`: one account's combined equity, collateral and health
//! - `summary`: portfolio totals across wallets
//!
//! Missing market data (oracle, interest, funding) always degrades to a
//! documented zero/default, never to an error: a partial view of an
//! account is still a valid view.

pub mod balance;
pub mod equity;
pub mod position;
pub mod summary;

pub use balance::{compute_balances, DerivedBalance, SpotMarketState};
pub use equity::{compute_equity, AccountEquity};
pub use position::{compute_positions, DerivedPosition, Direction, PerpMarketState};
pub use summary::{compute_summary, PortfolioSummary, WalletAccount, WalletSummary};

//! Data-source clients for on-chain account state.
//!
//! The [`ChainClient`] trait is the boundary between the pure calculators
//! and the outside world. Two implementations are provided:
//! - [`DriftClient`]: Drift protocol accounts via its data REST API
//! - [`HyperliquidClient`]: Hyperliquid accounts via the `info` endpoint
//!
//! Error convention: `Err(ChainError)` means the fetch itself failed
//! (network, HTTP status, undecodable body). `Ok(None)` means the fetch
//! worked but the datum does not exist (unknown market, no oracle) — the
//! calculators treat that as their degrade-to-zero branch. The two must
//! not be conflated: only fetch failures mark a wallet as failed.

pub mod client;
pub mod drift;
pub mod error;
pub mod hyperliquid;

pub use client::{ChainClient, MockChainClient, SubaccountProbe};
pub use drift::DriftClient;
pub use error::{ChainError, ChainResult};
pub use hyperliquid::HyperliquidClient;

//! The fetch-then-compute pipeline.
//!
//! Resolves tracked wallets to raw on-chain state through an injected
//! [`folio_chain::ChainClient`], runs the pure calculators over it, and
//! reduces the results into a portfolio summary. Wallets are independent,
//! so they are fetched concurrently and one wallet's fetch failure never
//! aborts the others.

pub mod error;
pub mod service;
pub mod snapshot;

pub use error::{PortfolioError, PortfolioResult};
pub use service::PortfolioService;
pub use snapshot::AccountSnapshot;

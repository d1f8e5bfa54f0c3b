//! Pipeline error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error(transparent)]
    Address(#[from] folio_core::CoreError),

    #[error(transparent)]
    Chain(#[from] folio_chain::ChainError),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Chain(#[from] folio_chain::ChainError),

    #[error(transparent)]
    Portfolio(#[from] folio_portfolio::PortfolioError),
}

pub type AppResult<T> = Result<T, AppError>;

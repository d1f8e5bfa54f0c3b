//! Chain client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ChainResult<T> = Result<T, ChainError>;

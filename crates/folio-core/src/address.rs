//! Wallet address validation.
//!
//! A thin precondition in front of any chain fetch: Solana addresses are
//! Base58-encoded 32-byte public keys (32-44 characters), EVM addresses
//! are `0x` followed by 40 hex characters. Malformed input is rejected
//! here so the fetch layer never sees it.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain family a wallet address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Solana (Drift).
    Solana,
    /// EVM (Hyperliquid).
    Evm,
}

/// A validated wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletAddress {
    address: String,
    chain: Chain,
}

impl WalletAddress {
    /// Parse and validate a wallet address, detecting the chain from its
    /// shape. Returns `CoreError::InvalidAddress` for anything else.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if Self::is_evm(trimmed) {
            return Ok(Self {
                // EVM addresses are case-insensitive; normalize for keying.
                address: trimmed.to_ascii_lowercase(),
                chain: Chain::Evm,
            });
        }
        if Self::is_solana(trimmed) {
            return Ok(Self {
                address: trimmed.to_string(),
                chain: Chain::Solana,
            });
        }
        Err(CoreError::InvalidAddress(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    fn is_evm(s: &str) -> bool {
        let Some(body) = s.strip_prefix("0x") else {
            return false;
        };
        body.len() == 40 && hex::decode(body).is_ok()
    }

    fn is_solana(s: &str) -> bool {
        if !(32..=44).contains(&s.len()) {
            return false;
        }
        matches!(bs58::decode(s).into_vec(), Ok(bytes) if bytes.len() == 32)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

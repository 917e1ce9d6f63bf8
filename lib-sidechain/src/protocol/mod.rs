//! Protocol Parameters Module
//!
//! Consensus-critical anchor heights at which chain behaviour changes. Every
//! node must compute the same answers for any height, so these values are
//! part of the chain definition, not local tuning.
//!
//! # Virtual Transaction Activation
//!
//! - **Pending unstakes**: from `pending_unstakes_from_height` the tokens
//!   contract settles pending unstakes and undelegations every block.
//! - **Witness scheduling**: every block, no activation height.
//! - **Inflation**: from `inflation_from_height`, on anchor heights that are a
//!   multiple of `inflation_interval`.
//! - **NFT undelegations**: from `nft_undelegations_from_height`, every block.
//!
//! # Design Principles
//!
//! 1. **Deterministic**: activation depends only on the anchor height
//! 2. **Forward-only**: once active at height H, active at every height > H

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mainnet activation heights
pub mod mainnet {
    pub const PENDING_UNSTAKES_FROM_HEIGHT: u64 = 32_713_424;
    pub const INFLATION_FROM_HEIGHT: u64 = 38_145_385;
    pub const NFT_UNDELEGATIONS_FROM_HEIGHT: u64 = 38_145_385;
    pub const INFLATION_INTERVAL: u64 = 1200;
}

/// Errors related to protocol parameters
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Inflation interval must be greater than zero")]
    ZeroInflationInterval,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Activation heights for virtual transactions, in anchor-chain blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    pub pending_unstakes_from_height: u64,
    pub inflation_from_height: u64,
    pub inflation_interval: u64,
    pub nft_undelegations_from_height: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ProtocolParams {
    pub fn mainnet() -> Self {
        Self {
            pending_unstakes_from_height: mainnet::PENDING_UNSTAKES_FROM_HEIGHT,
            inflation_from_height: mainnet::INFLATION_FROM_HEIGHT,
            inflation_interval: mainnet::INFLATION_INTERVAL,
            nft_undelegations_from_height: mainnet::NFT_UNDELEGATIONS_FROM_HEIGHT,
        }
    }

    /// Every feature active from height 0 (test networks).
    pub fn all_active() -> Self {
        Self {
            pending_unstakes_from_height: 0,
            inflation_from_height: 0,
            inflation_interval: mainnet::INFLATION_INTERVAL,
            nft_undelegations_from_height: 0,
        }
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        if self.inflation_interval == 0 {
            return Err(ProtocolError::ZeroInflationInterval);
        }
        Ok(())
    }
}

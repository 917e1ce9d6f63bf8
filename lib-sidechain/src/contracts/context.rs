//! Execution context handed to contract runtimes.
//!
//! Everything a contract may observe about its environment is carried here
//! explicitly; there is no ambient global state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Block-level facts shared by every transaction in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub block_number: u64,
    pub ref_block_number: u64,
    /// Anchor-chain wall clock, ISO-8601 text
    pub timestamp: String,
    pub ref_block_id: String,
    pub prev_ref_block_id: String,
}

/// Immutable context for one contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub block: BlockContext,
    /// Account that signed the transaction
    pub sender: String,
    /// Contract being called
    pub contract: String,
    pub action: String,
    pub transaction_id: String,
    /// Time budget for the whole call, nested calls included
    pub timeout: Duration,
}

impl ExecutionContext {
    pub fn new(
        block: BlockContext,
        sender: &str,
        contract: &str,
        action: &str,
        transaction_id: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            block,
            sender: sender.to_string(),
            contract: contract.to_string(),
            action: action.to_string(),
            transaction_id: transaction_id.to_string(),
            timeout,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block.block_number
    }

    pub fn timestamp(&self) -> &str {
        &self.block.timestamp
    }
}

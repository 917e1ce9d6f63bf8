//! Core block structures
//!
//! # Block Hash Inputs
//!
//! The block hash is SHA-256 over the concatenation of these fields, in order:
//!
//! | Field | Purpose |
//! |-------|---------|
//! | `previous_hash` | Links this block to its parent |
//! | `previous_state_hash` | Store state this block was executed on |
//! | `block_number` | Canonical position in the sidechain (decimal text) |
//! | `ref_block_number` | Anchor block height (decimal text) |
//! | `ref_block_id` | Anchor block id |
//! | `prev_ref_block_id` | Anchor block's parent id |
//! | `timestamp` | Anchor-chain wall clock |
//! | `transactions` | JSON array of the real transactions |
//!
//! ## Not Hashed
//!
//! | Field | Purpose |
//! |-------|---------|
//! | `virtual_transactions` | Committed through `merkle_root` / `state_hash` instead |
//! | `merkle_root`, `state_hash` | Pairwise fold over real ++ virtual transactions |
//! | `round` .. `round_signature` | Witness round metadata, filled by the witness layer |
//!
//! # Lifecycle
//!
//! ```text
//! Block::new (built, hash over unprocessed transactions)
//!     │
//!     └── BlockProducer::produce(block) ──► SealedBlock (read-only)
//! ```
//!
//! A [`SealedBlock`] can only be obtained from the producer, the genesis
//! constructor or by decoding persisted bytes. It dereferences to [`Block`]
//! but offers no mutable access.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::contracts::BlockContext;
use crate::execution::{BlockProductionError, ProductionResult};
use crate::transaction::Transaction;
use crate::types::{sha256_hex_concat, EMPTY_ROOT};

/// Timestamp of the genesis block
pub const GENESIS_TIMESTAMP: &str = "2018-06-01T00:00:00";

/// `previous_hash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// One referenced anchor-chain block, as delivered by the anchor feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorBlock {
    pub ref_block_number: u64,
    pub ref_block_id: String,
    pub prev_ref_block_id: String,
    pub timestamp: String,
    /// Sidechain transactions carried by the anchor block, in admission order
    pub transactions: Vec<Transaction>,
}

/// Sidechain block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_number: u64,
    pub ref_block_number: u64,
    pub ref_block_id: String,
    pub prev_ref_block_id: String,
    pub previous_hash: String,
    pub previous_state_hash: String,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
    pub virtual_transactions: Vec<Transaction>,
    pub hash: String,
    /// State root of the pairwise fold, empty for a block without transactions
    pub state_hash: String,
    pub merkle_root: String,

    // Witness round metadata
    pub round: Option<u64>,
    pub round_hash: String,
    pub witness: String,
    pub signing_key: String,
    pub round_signature: String,
}

/// JSON array text of a transaction list, as fed into the block hash.
pub fn transactions_json(transactions: &[Transaction]) -> ProductionResult<String> {
    serde_json::to_string(transactions)
        .map_err(|e| BlockProductionError::Serialization(e.to_string()))
}

impl Block {
    /// Build an unexecuted block on top of a parent's hash and state hash.
    pub fn new(
        block_number: u64,
        previous_hash: impl Into<String>,
        previous_state_hash: impl Into<String>,
        anchor: AnchorBlock,
    ) -> ProductionResult<Self> {
        let mut block = Self {
            block_number,
            ref_block_number: anchor.ref_block_number,
            ref_block_id: anchor.ref_block_id,
            prev_ref_block_id: anchor.prev_ref_block_id,
            previous_hash: previous_hash.into(),
            previous_state_hash: previous_state_hash.into(),
            timestamp: anchor.timestamp,
            transactions: anchor.transactions,
            virtual_transactions: Vec::new(),
            hash: String::new(),
            state_hash: EMPTY_ROOT.to_string(),
            merkle_root: EMPTY_ROOT.to_string(),
            round: None,
            round_hash: String::new(),
            witness: String::new(),
            signing_key: String::new(),
            round_signature: String::new(),
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    /// Hash over the header fields and the current transaction list.
    pub fn calculate_hash(&self) -> ProductionResult<String> {
        Ok(self.hash_with_transactions(&transactions_json(&self.transactions)?))
    }

    /// Hash over the header fields and an already serialized transaction list.
    pub fn hash_with_transactions(&self, transactions_json: &str) -> String {
        let block_number = self.block_number.to_string();
        let ref_block_number = self.ref_block_number.to_string();
        sha256_hex_concat(&[
            &self.previous_hash,
            &self.previous_state_hash,
            &block_number,
            &ref_block_number,
            &self.ref_block_id,
            &self.prev_ref_block_id,
            &self.timestamp,
            transactions_json,
        ])
    }

    /// Facts about this block exposed to contracts.
    pub fn context(&self) -> BlockContext {
        BlockContext {
            block_number: self.block_number,
            ref_block_number: self.ref_block_number,
            timestamp: self.timestamp.clone(),
            ref_block_id: self.ref_block_id.clone(),
            prev_ref_block_id: self.prev_ref_block_id.clone(),
        }
    }

    /// Real transactions followed by virtual ones.
    pub fn all_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().chain(self.virtual_transactions.iter())
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len() + self.virtual_transactions.len()
    }
}

/// A block whose execution, filtering and roots are final
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedBlock(Block);

impl SealedBlock {
    pub(crate) fn seal(block: Block) -> Self {
        Self(block)
    }

    /// Genesis block: height 0, no transactions, previous hash `"0"`.
    pub fn genesis(timestamp: &str) -> ProductionResult<Self> {
        let anchor = AnchorBlock {
            ref_block_number: 0,
            ref_block_id: String::new(),
            prev_ref_block_id: String::new(),
            timestamp: timestamp.to_string(),
            transactions: Vec::new(),
        };
        Ok(Self(Block::new(0, GENESIS_PREVIOUS_HASH, EMPTY_ROOT, anchor)?))
    }

    pub fn block(&self) -> &Block {
        &self.0
    }
}

impl Deref for SealedBlock {
    type Target = Block;

    fn deref(&self) -> &Block {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sha256_hex;

    fn anchor(transactions: Vec<Transaction>) -> AnchorBlock {
        AnchorBlock {
            ref_block_number: 100,
            ref_block_id: "R".into(),
            prev_ref_block_id: "Q".into(),
            timestamp: "2019-01-01T00:00:00".into(),
            transactions,
        }
    }

    #[test]
    fn test_new_block_hash_over_header_and_transactions() {
        let block = Block::new(5, "P", "S", anchor(Vec::new())).unwrap();
        assert_eq!(block.hash, sha256_hex("PS5100RQ2019-01-01T00:00:00[]"));
        assert_eq!(block.merkle_root, "");
        assert_eq!(block.state_hash, "");
        assert!(block.virtual_transactions.is_empty());
    }

    #[test]
    fn test_hash_changes_with_transactions() {
        let empty = Block::new(5, "P", "S", anchor(Vec::new())).unwrap();
        let tx = Transaction::new(100, "t", "alice", "tokens", "transfer", "");
        let with_tx = Block::new(5, "P", "S", anchor(vec![tx])).unwrap();
        assert_ne!(empty.hash, with_tx.hash);
    }

    #[test]
    fn test_genesis() {
        let genesis = SealedBlock::genesis(GENESIS_TIMESTAMP).unwrap();
        assert_eq!(genesis.block_number, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.state_hash, "");
        assert_eq!(genesis.hash, genesis.calculate_hash().unwrap());
    }

    #[test]
    fn test_json_layout() {
        let block = Block::new(1, "P", "S", anchor(Vec::new())).unwrap();
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["blockNumber"], 1);
        assert_eq!(value["previousStateHash"], "S");
        assert!(value["virtualTransactions"].as_array().unwrap().is_empty());
        assert!(value["round"].is_null());
    }

    #[test]
    fn test_sealed_block_bincode_round_trip() {
        let genesis = SealedBlock::genesis(GENESIS_TIMESTAMP).unwrap();
        let bytes = bincode::serialize(&genesis).unwrap();
        let decoded: SealedBlock = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, genesis);
    }
}

//! Sidechain: an append-only sequence of sealed blocks.
//!
//! A block links to its parent only through `previous_hash` and
//! `previous_state_hash`. [`Chain::verify_link`] checks both plus the height,
//! and [`Chain::append`] refuses any block that fails it.

use thiserror::Error;
use tracing::info;

use crate::block::{AnchorBlock, Block, BlockProducer, SealedBlock};
use crate::execution::BlockProductionError;
use crate::storage::{SledBlockLog, StateStore, StorageError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Block {height} does not link to its parent: {reason}")]
    BrokenLink { height: u64, reason: String },

    #[error("Block height mismatch: expected {expected}, got {actual}")]
    HeightMismatch { expected: u64, actual: u64 },

    #[error("Block production failed: {0}")]
    Production(#[from] BlockProductionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ChainResult<T> = Result<T, ChainError>;

#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<SealedBlock>,
}

impl Chain {
    /// Start a chain from its genesis block.
    pub fn new(genesis: SealedBlock) -> ChainResult<Self> {
        if genesis.block_number != 0 {
            return Err(ChainError::HeightMismatch {
                expected: 0,
                actual: genesis.block_number,
            });
        }
        Ok(Self {
            blocks: vec![genesis],
        })
    }

    /// Rebuild a chain from a persisted block log, verifying every link.
    pub fn load(log: &SledBlockLog) -> ChainResult<Option<Self>> {
        let mut blocks = log.iter();
        let genesis = match blocks.next() {
            Some(genesis) => genesis?,
            None => return Ok(None),
        };
        let mut chain = Self::new(genesis)?;
        for block in blocks {
            chain.append(block?)?;
        }
        info!(height = chain.height(), "chain loaded from block log");
        Ok(Some(chain))
    }

    pub fn tip(&self) -> &SealedBlock {
        // never empty: constructed with a genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn height(&self) -> u64 {
        self.tip().block_number
    }

    pub fn get(&self, height: u64) -> Option<&SealedBlock> {
        usize::try_from(height).ok().and_then(|h| self.blocks.get(h))
    }

    pub fn blocks(&self) -> &[SealedBlock] {
        &self.blocks
    }

    /// Check that `child` extends `parent`.
    pub fn verify_link(parent: &Block, child: &Block) -> ChainResult<()> {
        let broken = |reason: String| ChainError::BrokenLink {
            height: child.block_number,
            reason,
        };
        if child.block_number != parent.block_number + 1 {
            return Err(ChainError::HeightMismatch {
                expected: parent.block_number + 1,
                actual: child.block_number,
            });
        }
        if child.previous_hash != parent.hash {
            return Err(broken(format!(
                "previous_hash {} != parent hash {}",
                child.previous_hash, parent.hash
            )));
        }
        if child.previous_state_hash != parent.state_hash {
            return Err(broken(format!(
                "previous_state_hash {} != parent state_hash {}",
                child.previous_state_hash, parent.state_hash
            )));
        }
        Ok(())
    }

    pub fn append(&mut self, block: SealedBlock) -> ChainResult<()> {
        Self::verify_link(self.tip(), &block)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Build the next block on the tip from an anchor block.
    pub fn next_block(&self, anchor: AnchorBlock) -> ChainResult<Block> {
        let tip = self.tip();
        Ok(Block::new(
            tip.block_number + 1,
            tip.hash.clone(),
            tip.state_hash.clone(),
            anchor,
        )?)
    }

    /// Build, produce and append the next block.
    pub fn produce_next(
        &mut self,
        producer: &BlockProducer<'_>,
        store: &mut dyn StateStore,
        anchor: AnchorBlock,
    ) -> ChainResult<&SealedBlock> {
        let block = self.next_block(anchor)?;
        let sealed = producer.produce(store, block)?;
        self.append(sealed)?;
        Ok(self.tip())
    }
}

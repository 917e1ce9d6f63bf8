//! Block production
//!
//! ```text
//! BlockProducer::produce(block)
//!     │
//!     ├── 0. Reject blocks holding processed transactions
//!     │
//!     ├── 1. For each real transaction, in order:
//!     │       process(tx, state_hash) → state_hash = tx.state_hash
//!     │
//!     ├── 2. Snapshot the processed real list (block hash input)
//!     │
//!     ├── 3. Drop `comments` transactions with empty logs
//!     │
//!     ├── 4. For each virtual transaction due at ref_block_number:
//!     │       process(tx, state_hash) → state_hash = tx.state_hash
//!     │       keep only if the entry retains its outcome
//!     │
//!     └── 5. Seal: if any transaction remains
//!             (merkle_root, state_hash) = fold(real ++ virtual)
//!             hash = H(header ++ json(snapshot))
//! ```
//!
//! The store is borrowed mutably for the whole call; a fatal error drops the
//! in-flight block.

use tracing::{debug, info};

use super::core::{transactions_json, Block, SealedBlock};
use crate::config::{ChainConfig, ProducerConfig};
use crate::contracts::ContractRuntime;
use crate::execution::merkle;
use crate::execution::{
    BlockProductionError, ProductionResult, TransactionProcessor, VirtualTransactionScheduler,
};
use crate::storage::StateStore;

/// Social-layer contract whose no-op transactions are not persisted
pub const COMMENTS_CONTRACT: &str = "comments";

/// Turns built blocks into sealed blocks
pub struct BlockProducer<'r> {
    runtime: &'r dyn ContractRuntime,
    config: ProducerConfig,
    scheduler: VirtualTransactionScheduler,
}

impl<'r> BlockProducer<'r> {
    pub fn new(runtime: &'r dyn ContractRuntime, config: &ChainConfig) -> Self {
        Self {
            runtime,
            config: config.producer.clone(),
            scheduler: VirtualTransactionScheduler::from_params(&config.protocol),
        }
    }

    /// Use a custom activation table.
    pub fn with_scheduler(mut self, scheduler: VirtualTransactionScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn scheduler(&self) -> &VirtualTransactionScheduler {
        &self.scheduler
    }

    /// Execute, filter and seal `block`.
    ///
    /// Fails without touching the store if any transaction was already
    /// processed, e.g. a block cloned out of a [`SealedBlock`].
    pub fn produce(&self, store: &mut dyn StateStore, block: Block) -> ProductionResult<SealedBlock> {
        if let Some(tx) = block.all_transactions().find(|tx| tx.is_processed()) {
            return Err(BlockProductionError::AlreadyProcessed {
                transaction_id: tx.transaction_id().to_string(),
            });
        }
        let mut block = block;
        let processor = TransactionProcessor::new(self.runtime, &self.config);
        let context = block.context();
        let mut state_hash = block.previous_state_hash.clone();

        let mut outcomes = Vec::with_capacity(block.transactions.len());
        for tx in block.transactions.iter_mut() {
            outcomes.push(processor.process(store, &context, tx, &state_hash)?);
            state_hash = tx.state_hash().unwrap_or_default().to_string();
        }

        let hashed_transactions = transactions_json(&block.transactions)?;

        let before = block.transactions.len();
        let mut outcomes = outcomes.into_iter();
        block.transactions.retain(|tx| {
            let trivial = outcomes.next().map_or(false, |o| o.is_noop());
            !(tx.contract() == Some(COMMENTS_CONTRACT) && trivial)
        });
        if block.transactions.len() != before {
            debug!(
                block_number = block.block_number,
                dropped = before - block.transactions.len(),
                "dropped no-op comments transactions"
            );
        }

        for scheduled in self.scheduler.schedule(block.ref_block_number) {
            let mut tx = scheduled.transaction;
            let outcome = processor.process(store, &context, &mut tx, &state_hash)?;
            state_hash = tx.state_hash().unwrap_or_default().to_string();

            let keep = scheduled.entry.retains(&outcome);
            debug!(
                transaction_id = tx.transaction_id(),
                contract = %scheduled.entry.contract,
                action = %scheduled.entry.action,
                keep,
                "virtual transaction processed"
            );
            if keep {
                block.virtual_transactions.push(tx);
            }
        }

        if block.transaction_count() > 0 {
            let leaves: Vec<(&str, &str)> = block
                .all_transactions()
                .map(|tx| (tx.hash().unwrap_or_default(), tx.state_hash().unwrap_or_default()))
                .collect();
            let roots = merkle::fold(&leaves);
            block.merkle_root = roots.tx_root;
            block.state_hash = roots.state_root;
            block.hash = block.hash_with_transactions(&hashed_transactions);
        }

        info!(
            block_number = block.block_number,
            ref_block_number = block.ref_block_number,
            transactions = block.transactions.len(),
            virtual_transactions = block.virtual_transactions.len(),
            hash = %block.hash,
            "block sealed"
        );
        Ok(SealedBlock::seal(block))
    }
}

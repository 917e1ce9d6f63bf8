//! Execution Errors
//!
//! Only store-epoch failures and attempts to re-execute processed
//! transactions abort block production. Contract failures,
//! malformed transactions and unauthorized deployments are recorded in the
//! transaction logs instead and never surface here.

use thiserror::Error;

use crate::storage::StorageError;

/// Error that aborts production of the in-flight block
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockProductionError {
    #[error("State hash epoch failed for transaction {transaction_id}: {source}")]
    StateEpoch {
        transaction_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Transaction {transaction_id} has already been processed")]
    AlreadyProcessed { transaction_id: String },

    #[error("Block serialization failed: {0}")]
    Serialization(String),
}

pub type ProductionResult<T> = Result<T, BlockProductionError>;

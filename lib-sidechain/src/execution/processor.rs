//! Transaction processor.
//!
//! ```text
//! process(tx, current_state_hash)
//!     │
//!     ├── 0. tx already processed → AlreadyProcessed          [fatal]
//!     │
//!     ├── 1. store.begin_hash_epoch(current_state_hash)     [fatal on error]
//!     │
//!     ├── 2. sender, contract, action present?
//!     │       ├── no  → "the parameters sender, contract and action are required"
//!     │       ├── contract.deploy / contract.update with payload
//!     │       │       ├── privileged sender → runtime.deploy
//!     │       │       └── otherwise        → "the contract deployment is currently unavailable"
//!     │       ├── payload not a JSON object → "invalid payload: ..."
//!     │       └── anything else → runtime.invoke
//!     │
//!     ├── 3. tx.state_hash = store.current_epoch_hash()     [fatal on error]
//!     │
//!     └── 4. attach logs + executed code hash, compute tx.hash
//! ```

use std::time::Duration;

use tracing::{debug, warn};

use super::errors::{BlockProductionError, ProductionResult};
use crate::config::ProducerConfig;
use crate::contracts::{
    BlockContext, ContractRuntime, ExecutionContext, ExecutionResult, DEPLOYER_CONTRACT,
    DEPLOY_ACTION, UPDATE_ACTION,
};
use crate::storage::{StateStore, StorageError};
use crate::transaction::{messages, ExecutionOutcome, FailureKind, Transaction};

/// Executes single transactions and threads the store hash through them
pub struct TransactionProcessor<'r> {
    runtime: &'r dyn ContractRuntime,
    privileged_senders: &'r [String],
    timeout: Duration,
}

impl<'r> TransactionProcessor<'r> {
    pub fn new(runtime: &'r dyn ContractRuntime, config: &'r ProducerConfig) -> Self {
        Self {
            runtime,
            privileged_senders: &config.privileged_senders,
            timeout: config.execution_timeout(),
        }
    }

    fn is_privileged(&self, sender: &str) -> bool {
        self.privileged_senders.iter().any(|s| s == sender)
    }

    fn execute(
        &self,
        store: &mut dyn StateStore,
        block: &BlockContext,
        tx: &Transaction,
    ) -> ExecutionResult {
        let (sender, contract, action) = match tx.call_target() {
            Some(target) => target,
            None => {
                return ExecutionResult::failed(
                    FailureKind::MissingParameters,
                    messages::MISSING_PARAMETERS,
                )
            }
        };

        let is_deployment = contract == DEPLOYER_CONTRACT
            && (action == DEPLOY_ACTION || action == UPDATE_ACTION)
            && !tx.payload().is_empty();
        if is_deployment && !self.is_privileged(sender) {
            return ExecutionResult::failed(FailureKind::DeploymentUnavailable, messages::DEPLOYMENT_UNAVAILABLE);
        }

        let ctx = ExecutionContext::new(
            block.clone(),
            sender,
            contract,
            action,
            tx.transaction_id(),
            self.timeout,
        );
        if is_deployment {
            return self.runtime.deploy(store, tx, &ctx);
        }

        if let Err(e) = tx.payload().parse() {
            return ExecutionResult::failed(FailureKind::InvalidPayload, format!("invalid payload: {e}"));
        }
        self.runtime.invoke(store, tx, &ctx)
    }

    /// Execute `tx` on top of `current_state_hash` and record the result on it.
    ///
    /// Contract-level failures are written to the transaction logs. Only a
    /// failure of the store's hash epoch, or a transaction that was already
    /// processed, is returned as an error.
    pub fn process(
        &self,
        store: &mut dyn StateStore,
        block: &BlockContext,
        tx: &mut Transaction,
        current_state_hash: &str,
    ) -> ProductionResult<ExecutionOutcome> {
        let epoch_error = |source: StorageError| {
            warn!(transaction_id = tx.transaction_id(), error = %source, "state hash epoch failed");
            BlockProductionError::StateEpoch {
                transaction_id: tx.transaction_id().to_string(),
                source,
            }
        };

        if tx.is_processed() {
            return Err(BlockProductionError::AlreadyProcessed {
                transaction_id: tx.transaction_id().to_string(),
            });
        }
        store.begin_hash_epoch(current_state_hash).map_err(epoch_error)?;
        let result = self.execute(store, block, tx);
        let state_hash = store.current_epoch_hash().map_err(epoch_error)?;

        debug!(
            transaction_id = tx.transaction_id(),
            contract = tx.contract().unwrap_or(""),
            action = tx.action().unwrap_or(""),
            outcome = ?result.outcome,
            "transaction processed"
        );

        tx.record_execution(result.logs, result.executed_code_hash, state_hash);
        Ok(result.outcome)
    }
}

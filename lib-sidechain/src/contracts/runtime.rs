//! The contract runtime seam used by the transaction processor.

use super::context::ExecutionContext;
use crate::storage::StateStore;
use crate::transaction::{messages, ExecutionOutcome, FailureKind, Transaction, TransactionLogs};

/// What a runtime reports back for one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub logs: TransactionLogs,
    /// Hash of the deployed code that ran, if any
    pub executed_code_hash: Option<String>,
    pub outcome: ExecutionOutcome,
}

impl ExecutionResult {
    /// Result of code that ran to completion; the outcome is read from the logs.
    pub fn completed(logs: TransactionLogs, executed_code_hash: Option<String>) -> Self {
        let outcome = ExecutionOutcome::from_logs(&logs);
        Self {
            logs,
            executed_code_hash,
            outcome,
        }
    }

    /// Single-error failure that never reached contract code.
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            logs: TransactionLogs::single_error(message),
            executed_code_hash: None,
            outcome: ExecutionOutcome::Failure(kind),
        }
    }

    /// The called contract is not deployed.
    pub fn contract_missing(contract: &str, action: &str) -> Self {
        Self {
            logs: TransactionLogs::single_error(messages::CONTRACT_MISSING),
            executed_code_hash: None,
            outcome: ExecutionOutcome::FeatureUnavailable {
                contract: contract.to_string(),
                action: action.to_string(),
            },
        }
    }
}

/// Deploys and runs contracts against a state store.
///
/// Implementations must be deterministic apart from the time budget in the
/// context, and must report contract failures through the result rather
/// than by panicking.
pub trait ContractRuntime {
    /// Deploy or update the contract described by the transaction payload.
    fn deploy(
        &self,
        store: &mut dyn StateStore,
        tx: &Transaction,
        ctx: &ExecutionContext,
    ) -> ExecutionResult;

    /// Run `ctx.action` on the deployed contract `ctx.contract`.
    fn invoke(
        &self,
        store: &mut dyn StateStore,
        tx: &Transaction,
        ctx: &ExecutionContext,
    ) -> ExecutionResult;
}

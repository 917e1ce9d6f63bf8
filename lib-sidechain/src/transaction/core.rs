//! Core transaction structure
//!
//! A transaction carries its anchor reference, the contract call it requests
//! and, once processed, the execution record: logs, the hash of the code that
//! ran, the store hash after execution and its own digest.

use serde::{Deserialize, Serialize};

use super::logs::TransactionLogs;
use super::payload::Payload;
use crate::types::sha256_hex_concat;

/// Contract call recorded on the sidechain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Height of the anchor block that carried this transaction
    ref_block_number: u64,
    /// Caller-supplied id; virtual transactions use `<anchorHeight>-<index>`
    transaction_id: String,
    sender: Option<String>,
    contract: Option<String>,
    action: Option<String>,
    payload: Payload,
    /// Hash of the deployed code that ran, empty when none did
    executed_code_hash: String,
    /// Self-hash, absent until processed
    hash: Option<String>,
    /// Store hash after this transaction, absent until processed
    state_hash: Option<String>,
    logs: TransactionLogs,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl Transaction {
    /// Create an unprocessed transaction. Empty strings count as missing parameters.
    pub fn new(
        ref_block_number: u64,
        transaction_id: impl Into<String>,
        sender: &str,
        contract: &str,
        action: &str,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            ref_block_number,
            transaction_id: transaction_id.into(),
            sender: non_empty(sender),
            contract: non_empty(contract),
            action: non_empty(action),
            payload: payload.into(),
            executed_code_hash: String::new(),
            hash: None,
            state_hash: None,
            logs: TransactionLogs::new(),
        }
    }

    pub fn ref_block_number(&self) -> u64 {
        self.ref_block_number
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn contract(&self) -> Option<&str> {
        self.contract.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn executed_code_hash(&self) -> &str {
        &self.executed_code_hash
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn state_hash(&self) -> Option<&str> {
        self.state_hash.as_deref()
    }

    pub fn logs(&self) -> &TransactionLogs {
        &self.logs
    }

    pub fn is_processed(&self) -> bool {
        self.hash.is_some() && self.state_hash.is_some()
    }

    /// `(sender, contract, action)` when all three are present.
    pub fn call_target(&self) -> Option<(&str, &str, &str)> {
        match (self.sender(), self.contract(), self.action()) {
            (Some(sender), Some(contract), Some(action)) => Some((sender, contract, action)),
            _ => None,
        }
    }

    /// Digest over the envelope and its execution record.
    ///
    /// Input order: refBlockNumber, transactionId, sender, contract, action,
    /// payload, executedCodeHash, stateHash, logs. Absent strings contribute nothing.
    pub fn calculate_hash(&self) -> String {
        let ref_block = self.ref_block_number.to_string();
        let logs = self.logs.to_json();
        sha256_hex_concat(&[
            &ref_block,
            &self.transaction_id,
            self.sender().unwrap_or(""),
            self.contract().unwrap_or(""),
            self.action().unwrap_or(""),
            self.payload.as_str(),
            &self.executed_code_hash,
            self.state_hash().unwrap_or(""),
            &logs,
        ])
    }

    /// Attach the execution record and compute the self-hash.
    pub(crate) fn record_execution(
        &mut self,
        logs: TransactionLogs,
        executed_code_hash: Option<String>,
        state_hash: String,
    ) {
        debug_assert!(!self.is_processed(), "transaction recorded twice");
        self.logs = logs;
        self.executed_code_hash = executed_code_hash.unwrap_or_default();
        self.state_hash = Some(state_hash);
        self.hash = Some(self.calculate_hash());
    }
}

//! Host API exposed to native contracts.
//!
//! A contract only sees its own namespaced tables for writes, can read any
//! contract's tables, and reports results through events and errors. Every
//! host call checks the call deadline first, so a runaway contract stops at
//! its next store access.

use std::time::Instant;

use serde_json::Value;

use super::context::ExecutionContext;
use super::deploy::{qualified_table, strip_id};
use super::errors::ContractFault;
use super::native::NativeRuntime;
use crate::storage::{Document, Filter, Query, StateStore};
use crate::transaction::{ContractEvent, ExecutionOutcome, TransactionLogs};

/// Maximum nesting of contract-to-contract calls
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 10;

/// Error returned when call depth limit is exceeded
pub const CALL_DEPTH_EXCEEDED: &str = "Call depth limit exceeded";

pub struct ContractApi<'a> {
    store: &'a mut dyn StateStore,
    runtime: &'a NativeRuntime,
    ctx: &'a ExecutionContext,
    contract: String,
    owner: String,
    caller: Option<String>,
    params: Value,
    logs: TransactionLogs,
    created_tables: Vec<String>,
    deadline: Instant,
    depth: u32,
}

impl<'a> ContractApi<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: &'a mut dyn StateStore,
        runtime: &'a NativeRuntime,
        ctx: &'a ExecutionContext,
        contract: &str,
        owner: &str,
        caller: Option<String>,
        params: Value,
        deadline: Instant,
        depth: u32,
    ) -> Self {
        Self {
            store,
            runtime,
            ctx,
            contract: contract.to_string(),
            owner: owner.to_string(),
            caller,
            params,
            logs: TransactionLogs::new(),
            created_tables: Vec::new(),
            deadline,
            depth,
        }
    }

    // =========================================================================
    // Context
    // =========================================================================

    /// Account that signed the transaction
    pub fn sender(&self) -> &str {
        &self.ctx.sender
    }

    /// Contract currently executing
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Calling contract, for nested calls
    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// Account that deployed the executing contract
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Deployment parameters of the executing contract
    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn block_number(&self) -> u64 {
        self.ctx.block.block_number
    }

    pub fn ref_block_number(&self) -> u64 {
        self.ctx.block.ref_block_number
    }

    pub fn timestamp(&self) -> &str {
        &self.ctx.block.timestamp
    }

    pub fn ref_block_id(&self) -> &str {
        &self.ctx.block.ref_block_id
    }

    pub fn prev_ref_block_id(&self) -> &str {
        &self.ctx.block.prev_ref_block_id
    }

    pub fn transaction_id(&self) -> &str {
        &self.ctx.transaction_id
    }

    pub fn check_deadline(&self) -> Result<(), ContractFault> {
        if Instant::now() >= self.deadline {
            Err(ContractFault::Timeout)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Create `<contract>_<name>` if it does not exist yet.
    pub fn create_table(&mut self, name: &str, indexes: &[&str]) -> Result<(), ContractFault> {
        self.check_deadline()?;
        let table = qualified_table(&self.contract, name);
        if !self.store.table_exists(&table) {
            self.store.create_table(&table, indexes)?;
        }
        if !self.created_tables.contains(&table) {
            self.created_tables.push(table);
        }
        Ok(())
    }

    pub fn find_one(&mut self, table: &str, filter: &Filter) -> Result<Option<Document>, ContractFault> {
        let contract = self.contract.clone();
        self.find_one_in(&contract, table, filter)
    }

    pub fn find(&mut self, table: &str, query: &Query) -> Result<Vec<Document>, ContractFault> {
        let contract = self.contract.clone();
        self.find_in(&contract, table, query)
    }

    /// Read another contract's table.
    pub fn find_one_in(
        &mut self,
        contract: &str,
        table: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, ContractFault> {
        self.check_deadline()?;
        Ok(self.store.find_one(&qualified_table(contract, table), filter)?)
    }

    pub fn find_in(
        &mut self,
        contract: &str,
        table: &str,
        query: &Query,
    ) -> Result<Vec<Document>, ContractFault> {
        self.check_deadline()?;
        Ok(self.store.find(&qualified_table(contract, table), query)?)
    }

    pub fn insert(&mut self, table: &str, doc: Document) -> Result<Document, ContractFault> {
        self.check_deadline()?;
        let table = qualified_table(&self.contract, table);
        Ok(self.store.insert(&table, strip_id(doc))?)
    }

    pub fn update(&mut self, table: &str, doc: Document) -> Result<(), ContractFault> {
        self.check_deadline()?;
        let table = qualified_table(&self.contract, table);
        Ok(self.store.update(&table, doc)?)
    }

    pub fn remove(&mut self, table: &str, doc: &Document) -> Result<(), ContractFault> {
        self.check_deadline()?;
        let table = qualified_table(&self.contract, table);
        Ok(self.store.remove(&table, doc)?)
    }

    // =========================================================================
    // Logs
    // =========================================================================

    pub fn emit(&mut self, event: &str, data: Value) -> Result<(), ContractFault> {
        self.check_deadline()?;
        self.logs.push_event(ContractEvent {
            contract: self.contract.clone(),
            event: event.to_string(),
            data,
        });
        Ok(())
    }

    /// Log `message` as an error when `condition` is false. Returns `condition`.
    pub fn assert(&mut self, condition: bool, message: &str) -> bool {
        if !condition {
            self.logs.push_error(message);
        }
        condition
    }

    // =========================================================================
    // Nested calls
    // =========================================================================

    /// Call another deployed contract with the same sender and deadline.
    ///
    /// The callee's logs are appended to this transaction's logs. Only a
    /// timeout aborts the caller; other callee failures are reported through
    /// the returned outcome.
    pub fn execute_contract(
        &mut self,
        contract: &str,
        action: &str,
        payload: Value,
    ) -> Result<ExecutionOutcome, ContractFault> {
        self.check_deadline()?;
        if self.depth + 1 >= DEFAULT_MAX_CALL_DEPTH {
            return Err(ContractFault::error(CALL_DEPTH_EXCEEDED));
        }
        let runtime = self.runtime;
        let ctx = self.ctx;
        let caller = self.contract.clone();
        let (logs, outcome) = runtime.call_nested(
            &mut *self.store,
            ctx,
            contract,
            action,
            payload,
            &caller,
            self.deadline,
            self.depth + 1,
        )?;
        self.logs.extend(logs);
        Ok(outcome)
    }

    pub(crate) fn into_parts(self) -> (TransactionLogs, Vec<String>) {
        (self.logs, self.created_tables)
    }

    pub(crate) fn logs_mut(&mut self) -> &mut TransactionLogs {
        &mut self.logs
    }
}

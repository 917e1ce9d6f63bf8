//! Native contract runtime.
//!
//! Contracts are Rust types implementing [`NativeContract`], registered under
//! a module id. Deploying a contract binds a contract name to a module id and
//! records the deployment in the `contracts` table; invoking looks the name
//! up and dispatches to the module.
//!
//! ```text
//! invoke(contract, action, payload)
//!   ├─ action == createSSC          → "you cannot trigger the createSSC action"
//!   ├─ contract not deployed        → "contract doesn't exist"
//!   ├─ action not exported          → "unknown error"
//!   ├─ payload not an object/schema → "invalid payload: ..."
//!   └─ run action                   → events / errors / fault text
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, info};

use super::api::ContractApi;
use super::context::ExecutionContext;
use super::deploy::{
    is_valid_contract_name, ContractRecord, DeployRequest, CONTRACTS_TABLE, DEPLOYER_CONTRACT,
    DEPLOY_ACTION, RESERVED_INIT_ACTION,
};
use super::errors::ContractFault;
use super::runtime::{ContractRuntime, ExecutionResult};
use crate::storage::{Filter, StateStore, StorageError, ID_FIELD};
use crate::transaction::{
    messages, ContractEvent, ExecutionOutcome, FailureKind, PayloadError, PayloadObject,
    PayloadSchema, Transaction, TransactionLogs,
};

/// An action a contract exports, with its payload schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: String,
    pub schema: PayloadSchema,
}

impl ActionSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: PayloadSchema::new(),
        }
    }

    pub fn with_schema(mut self, schema: PayloadSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// Contract code compiled into the node.
pub trait NativeContract {
    /// Callable actions. The reserved initialiser is never listed here.
    fn actions(&self) -> Vec<ActionSpec>;

    /// Run one action. `createSSC` is passed the deployment params on deploy and update.
    fn execute(
        &self,
        api: &mut ContractApi<'_>,
        action: &str,
        payload: &PayloadObject,
    ) -> Result<(), ContractFault>;
}

/// Registry of native contract modules
#[derive(Default)]
pub struct NativeRuntime {
    modules: BTreeMap<String, Box<dyn NativeContract>>,
}

impl std::fmt::Debug for NativeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRuntime")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn store_failure(err: StorageError) -> ExecutionResult {
    ExecutionResult::failed(FailureKind::Contract, ContractFault::Store(err).to_string())
}

fn invalid_payload(err: PayloadError) -> ExecutionResult {
    ExecutionResult::failed(FailureKind::InvalidPayload, format!("invalid payload: {err}"))
}

impl NativeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register contract code under `code_id`, replacing any previous module.
    pub fn register(&mut self, code_id: &str, contract: impl NativeContract + 'static) -> &mut Self {
        self.modules.insert(code_id.to_string(), Box::new(contract));
        self
    }

    pub fn with_contract(mut self, code_id: &str, contract: impl NativeContract + 'static) -> Self {
        self.register(code_id, contract);
        self
    }

    pub fn has_code(&self, code_id: &str) -> bool {
        self.modules.contains_key(code_id)
    }

    fn load_record(
        store: &dyn StateStore,
        name: &str,
    ) -> Result<Option<ContractRecord>, StorageError> {
        if !store.table_exists(CONTRACTS_TABLE) {
            return Ok(None);
        }
        store
            .find_one(CONTRACTS_TABLE, &Filter::new().eq("name", name))?
            .map(ContractRecord::from_document)
            .transpose()
    }

    #[allow(clippy::too_many_arguments)]
    fn run_module(
        &self,
        store: &mut dyn StateStore,
        ctx: &ExecutionContext,
        record: &ContractRecord,
        module: &dyn NativeContract,
        action: &str,
        payload: &PayloadObject,
        caller: Option<String>,
        deadline: Instant,
        depth: u32,
    ) -> (TransactionLogs, Vec<String>, Result<(), ContractFault>) {
        let mut api = ContractApi::new(
            store,
            self,
            ctx,
            &record.name,
            &record.owner,
            caller,
            record.params.clone(),
            deadline,
            depth,
        );
        let result = api
            .check_deadline()
            .and_then(|_| module.execute(&mut api, action, payload));
        if let Err(fault) = &result {
            api.logs_mut().push_error(fault.to_string());
        }
        let (logs, tables) = api.into_parts();
        (logs, tables, result)
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        &self,
        store: &mut dyn StateStore,
        ctx: &ExecutionContext,
        contract: &str,
        action: &str,
        payload: Result<PayloadObject, PayloadError>,
        caller: Option<String>,
        deadline: Instant,
        depth: u32,
    ) -> ExecutionResult {
        if action == RESERVED_INIT_ACTION {
            return ExecutionResult::failed(FailureKind::ReservedAction, messages::RESERVED_ACTION);
        }

        let record = match Self::load_record(store, contract) {
            Ok(Some(record)) => record,
            Ok(None) => return ExecutionResult::contract_missing(contract, action),
            Err(e) => return store_failure(e),
        };

        let module = match self.modules.get(&record.code) {
            Some(module) => module.as_ref(),
            None => return ExecutionResult::failed(FailureKind::Unknown, messages::UNKNOWN_ERROR),
        };
        let spec = match module.actions().into_iter().find(|spec| spec.name == action) {
            Some(spec) => spec,
            None => return ExecutionResult::failed(FailureKind::Unknown, messages::UNKNOWN_ERROR),
        };

        let payload = match payload.and_then(|obj| spec.schema.validate(&obj).map(|_| obj)) {
            Ok(obj) => obj,
            Err(e) => return invalid_payload(e),
        };

        let (logs, _, result) =
            self.run_module(store, ctx, &record, module, action, &payload, caller, deadline, depth);
        let outcome = match result {
            Ok(()) => ExecutionOutcome::from_call_logs(&logs, contract, action),
            Err(ContractFault::Timeout) => ExecutionOutcome::Failure(FailureKind::Timeout),
            Err(_) => ExecutionOutcome::Failure(FailureKind::Contract),
        };
        ExecutionResult {
            logs,
            executed_code_hash: Some(record.code_hash),
            outcome,
        }
    }

    /// Contract-to-contract call made through [`ContractApi::execute_contract`].
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn call_nested(
        &self,
        store: &mut dyn StateStore,
        ctx: &ExecutionContext,
        contract: &str,
        action: &str,
        payload: Value,
        caller: &str,
        deadline: Instant,
        depth: u32,
    ) -> Result<(TransactionLogs, ExecutionOutcome), ContractFault> {
        let payload = match payload {
            Value::Object(obj) => Ok(obj),
            Value::Null => Ok(PayloadObject::new()),
            _ => Err(PayloadError::NotAnObject),
        };
        debug!(caller, contract, action, depth, "nested contract call");
        let result = self.dispatch(
            store,
            ctx,
            contract,
            action,
            payload,
            Some(caller.to_string()),
            deadline,
            depth,
        );
        if result.outcome == ExecutionOutcome::Failure(FailureKind::Timeout) {
            return Err(ContractFault::Timeout);
        }
        Ok((result.logs, result.outcome))
    }

    fn deploy_contract(
        &self,
        store: &mut dyn StateStore,
        tx: &Transaction,
        ctx: &ExecutionContext,
    ) -> ExecutionResult {
        let request = match DeployRequest::parse(tx.payload()) {
            Ok(request) => request,
            Err(e) => return invalid_payload(e),
        };
        if !is_valid_contract_name(&request.name) {
            return ExecutionResult::failed(
                FailureKind::DeploymentRejected,
                messages::INVALID_CONTRACT_NAME,
            );
        }
        let module = match self.modules.get(&request.code) {
            Some(module) => module.as_ref(),
            None => {
                return ExecutionResult::failed(FailureKind::DeploymentRejected, messages::UNKNOWN_CODE)
            }
        };

        if !store.table_exists(CONTRACTS_TABLE) {
            if let Err(e) = store.create_table(CONTRACTS_TABLE, &["name"]) {
                return store_failure(e);
            }
        }
        let existing = match Self::load_record(store, &request.name) {
            Ok(existing) => existing,
            Err(e) => return store_failure(e),
        };

        let is_deploy = ctx.action == DEPLOY_ACTION;
        let code_hash = request.code_hash();
        let mut record = match existing {
            Some(_) if is_deploy => {
                return ExecutionResult::failed(
                    FailureKind::DeploymentRejected,
                    messages::CONTRACT_EXISTS,
                )
            }
            None if !is_deploy => return ExecutionResult::contract_missing(&request.name, &ctx.action),
            Some(record) if record.owner != ctx.sender => {
                return ExecutionResult::failed(
                    FailureKind::DeploymentRejected,
                    messages::UPDATE_NOT_ALLOWED,
                )
            }
            Some(record) => ContractRecord {
                code: request.code.clone(),
                code_hash: code_hash.clone(),
                params: request.params.clone(),
                version: record.version + 1,
                ..record
            },
            None => ContractRecord {
                id: None,
                name: request.name.clone(),
                owner: ctx.sender.clone(),
                code: request.code.clone(),
                code_hash: code_hash.clone(),
                tables: Vec::new(),
                params: request.params.clone(),
                version: 1,
            },
        };

        let init_payload = match &request.params {
            Value::Object(obj) => obj.clone(),
            _ => PayloadObject::new(),
        };
        let deadline = Instant::now() + ctx.timeout;
        let (mut logs, tables, result) = self.run_module(
            store,
            ctx,
            &record,
            module,
            RESERVED_INIT_ACTION,
            &init_payload,
            None,
            deadline,
            0,
        );
        match result {
            Err(ContractFault::Timeout) => {
                return ExecutionResult {
                    logs,
                    executed_code_hash: None,
                    outcome: ExecutionOutcome::Failure(FailureKind::Timeout),
                }
            }
            Err(_) => return ExecutionResult::completed(logs, None),
            Ok(()) if logs.has_errors() => return ExecutionResult::completed(logs, None),
            Ok(()) => {}
        }

        for table in &tables {
            record.add_table(table);
        }
        let persisted = record.to_document().and_then(|mut doc| match record.id {
            Some(id) => {
                doc.insert(ID_FIELD.to_string(), Value::from(id));
                store.update(CONTRACTS_TABLE, doc)
            }
            None => store.insert(CONTRACTS_TABLE, doc).map(|_| ()),
        });
        if let Err(e) = persisted {
            return store_failure(e);
        }

        logs.push_event(ContractEvent {
            contract: DEPLOYER_CONTRACT.to_string(),
            event: ctx.action.clone(),
            data: json!({
                "name": record.name,
                "owner": record.owner,
                "codeHash": record.code_hash,
            }),
        });
        info!(
            contract = %record.name,
            owner = %record.owner,
            action = %ctx.action,
            version = record.version,
            "contract code installed"
        );
        ExecutionResult::completed(logs, Some(code_hash))
    }
}

impl ContractRuntime for NativeRuntime {
    fn deploy(
        &self,
        store: &mut dyn StateStore,
        tx: &Transaction,
        ctx: &ExecutionContext,
    ) -> ExecutionResult {
        self.deploy_contract(store, tx, ctx)
    }

    fn invoke(
        &self,
        store: &mut dyn StateStore,
        tx: &Transaction,
        ctx: &ExecutionContext,
    ) -> ExecutionResult {
        let deadline = Instant::now() + ctx.timeout;
        self.dispatch(
            store,
            ctx,
            &ctx.contract,
            &ctx.action,
            tx.payload().parse(),
            None,
            deadline,
            0,
        )
    }
}

//! Contract execution
//!
//! The transaction processor talks to contracts only through the
//! [`ContractRuntime`] trait. [`NativeRuntime`] is the bundled
//! implementation: contracts are Rust modules registered by id, deployed by
//! name through the `contract` pseudo-contract, and given a [`ContractApi`]
//! host object for table access and logging.

pub mod api;
pub mod context;
pub mod deploy;
pub mod errors;
pub mod native;
pub mod runtime;

pub use api::{ContractApi, CALL_DEPTH_EXCEEDED, DEFAULT_MAX_CALL_DEPTH};
pub use context::{BlockContext, ExecutionContext};
pub use deploy::{
    is_valid_contract_name, qualified_table, ContractRecord, DeployRequest, CONTRACTS_TABLE,
    DEPLOYER_CONTRACT, DEPLOY_ACTION, RESERVED_INIT_ACTION, UPDATE_ACTION,
};
pub use errors::ContractFault;
pub use native::{ActionSpec, NativeContract, NativeRuntime};
pub use runtime::{ContractRuntime, ExecutionResult};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::storage::{Filter, MemoryStore, StateStore};
    use crate::transaction::{
        messages, ExecutionOutcome, FailureKind, FieldKind, PayloadObject, PayloadSchema,
        Transaction,
    };

    /// Counter contract: `bump` increments a per-sender counter.
    struct Counter;

    impl NativeContract for Counter {
        fn actions(&self) -> Vec<ActionSpec> {
            vec![
                ActionSpec::new("bump").with_schema(PayloadSchema::new().optional("by", FieldKind::Number)),
                ActionSpec::new("relay"),
                ActionSpec::new("fail"),
                ActionSpec::new("spin"),
            ]
        }

        fn execute(
            &self,
            api: &mut ContractApi<'_>,
            action: &str,
            payload: &PayloadObject,
        ) -> Result<(), ContractFault> {
            match action {
                "createSSC" => api.create_table("counters", &["account"]),
                "bump" => {
                    let by = payload.get("by").and_then(Value::as_u64).unwrap_or(1);
                    let account = api.sender().to_string();
                    match api.find_one("counters", &Filter::new().eq("account", account.clone()))? {
                        Some(mut doc) => {
                            let value = doc["value"].as_u64().unwrap_or(0) + by;
                            doc.insert("value".into(), json!(value));
                            api.update("counters", doc)?;
                        }
                        None => {
                            let doc = json!({ "account": account, "value": by });
                            api.insert("counters", doc.as_object().cloned().unwrap_or_default())?;
                        }
                    }
                    api.emit("bumped", json!({ "by": by }))
                }
                "relay" => {
                    api.execute_contract("counter", "bump", json!({ "by": 2 }))?;
                    Ok(())
                }
                "fail" => {
                    api.assert(false, "counter is frozen");
                    Ok(())
                }
                "spin" => loop {
                    api.find_one("counters", &Filter::new())?;
                },
                _ => Ok(()),
            }
        }
    }

    fn block() -> BlockContext {
        BlockContext {
            block_number: 5,
            ref_block_number: 100,
            timestamp: "2018-06-01T00:00:00".into(),
            ref_block_id: "ref".into(),
            prev_ref_block_id: "prev".into(),
        }
    }

    fn ctx_for(tx: &Transaction, timeout: Duration) -> ExecutionContext {
        let (sender, contract, action) = tx.call_target().unwrap();
        ExecutionContext::new(block(), sender, contract, action, tx.transaction_id(), timeout)
    }

    fn deployed() -> (NativeRuntime, MemoryStore) {
        let runtime = NativeRuntime::new().with_contract("counter-v1", Counter);
        let mut store = MemoryStore::new();
        let tx = Transaction::new(
            100,
            "d1",
            "steemsc",
            "contract",
            "deploy",
            json!({ "name": "counter", "code": "counter-v1" }),
        );
        let result = runtime.deploy(&mut store, &tx, &ctx_for(&tx, Duration::from_secs(5)));
        assert_eq!(result.outcome, ExecutionOutcome::Success, "{:?}", result.logs);
        (runtime, store)
    }

    fn invoke(runtime: &NativeRuntime, store: &mut MemoryStore, action: &str, payload: Value) -> ExecutionResult {
        let tx = Transaction::new(100, "t", "alice", "counter", action, payload);
        runtime.invoke(store, &tx, &ctx_for(&tx, Duration::from_secs(5)))
    }

    #[test]
    fn test_deploy_records_contract_and_tables() {
        let (_, store) = deployed();
        let doc = store
            .find_one(CONTRACTS_TABLE, &Filter::new().eq("name", "counter"))
            .unwrap()
            .unwrap();
        let record = ContractRecord::from_document(doc).unwrap();
        assert_eq!(record.owner, "steemsc");
        assert_eq!(record.tables, vec!["counter_counters".to_string()]);
        assert!(store.table_exists("counter_counters"));
    }

    #[test]
    fn test_redeploy_rejected_and_update_requires_owner() {
        let (runtime, mut store) = deployed();
        let again = Transaction::new(
            100,
            "d2",
            "steemsc",
            "contract",
            "deploy",
            json!({ "name": "counter", "code": "counter-v1" }),
        );
        let result = runtime.deploy(&mut store, &again, &ctx_for(&again, Duration::from_secs(5)));
        assert!(result.logs.is_single_error(messages::CONTRACT_EXISTS));

        let update = Transaction::new(
            100,
            "d3",
            "null",
            "contract",
            "update",
            json!({ "name": "counter", "code": "counter-v1" }),
        );
        let result = runtime.deploy(&mut store, &update, &ctx_for(&update, Duration::from_secs(5)));
        assert!(result.logs.is_single_error(messages::UPDATE_NOT_ALLOWED));
    }

    #[test]
    fn test_deploy_validation() {
        let runtime = NativeRuntime::new().with_contract("counter-v1", Counter);
        let mut store = MemoryStore::new();
        let cases = [
            (json!({ "name": "x!", "code": "counter-v1" }), messages::INVALID_CONTRACT_NAME),
            (json!({ "name": "counter", "code": "missing" }), messages::UNKNOWN_CODE),
        ];
        for (payload, expected) in cases {
            let tx = Transaction::new(1, "d", "steemsc", "contract", "deploy", payload);
            let result = runtime.deploy(&mut store, &tx, &ctx_for(&tx, Duration::from_secs(5)));
            assert!(result.logs.is_single_error(expected), "{:?}", result.logs);
        }
    }

    #[test]
    fn test_invoke_updates_state_and_reports_code_hash() {
        let (runtime, mut store) = deployed();
        let result = invoke(&runtime, &mut store, "bump", json!({ "by": 3 }));
        assert_eq!(result.outcome, ExecutionOutcome::Success);
        assert_eq!(result.executed_code_hash, Some(crate::types::sha256_hex("counter-v1")));

        let doc = store
            .find_one("counter_counters", &Filter::new().eq("account", "alice"))
            .unwrap()
            .unwrap();
        assert_eq!(doc["value"], json!(3));
    }

    #[test]
    fn test_invoke_error_paths() {
        let (runtime, mut store) = deployed();

        let missing = Transaction::new(1, "t", "alice", "nft", "checkPendingUndelegations", "");
        let result = runtime.invoke(&mut store, &missing, &ctx_for(&missing, Duration::from_secs(5)));
        assert!(result.logs.is_single_error(messages::CONTRACT_MISSING));
        assert!(matches!(result.outcome, ExecutionOutcome::FeatureUnavailable { .. }));

        let result = invoke(&runtime, &mut store, "createSSC", json!({}));
        assert!(result.logs.is_single_error(messages::RESERVED_ACTION));

        let result = invoke(&runtime, &mut store, "nope", json!({}));
        assert!(result.logs.is_single_error(messages::UNKNOWN_ERROR));
        assert_eq!(result.outcome, ExecutionOutcome::Failure(FailureKind::Unknown));

        let result = invoke(&runtime, &mut store, "bump", json!({ "by": "lots" }));
        assert_eq!(result.outcome, ExecutionOutcome::Failure(FailureKind::InvalidPayload));
        assert_eq!(
            result.logs.errors(),
            ["invalid payload: field `by` must be a number".to_string()]
        );

        let result = invoke(&runtime, &mut store, "fail", json!({}));
        assert!(result.logs.is_single_error("counter is frozen"));
    }

    #[test]
    fn test_nested_call_merges_logs() {
        let (runtime, mut store) = deployed();
        let result = invoke(&runtime, &mut store, "relay", json!({}));
        assert_eq!(result.outcome, ExecutionOutcome::Success);
        assert_eq!(result.logs.events().len(), 1);
        assert_eq!(result.logs.events()[0].event, "bumped");
    }

    #[test]
    fn test_timeout_becomes_log_error() {
        let (runtime, mut store) = deployed();
        let tx = Transaction::new(100, "t", "alice", "counter", "spin", "");
        let result = runtime.invoke(&mut store, &tx, &ctx_for(&tx, Duration::from_millis(20)));
        assert!(result.logs.is_single_error(messages::TIMED_OUT));
        assert_eq!(result.outcome, ExecutionOutcome::Failure(FailureKind::Timeout));
    }
}

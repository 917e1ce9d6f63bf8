//! Shared fixtures: small native contracts and store setup.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};

use lib_sidechain::storage::{Filter, MemoryStore, Query};
use lib_sidechain::{
    messages, ActionSpec, AnchorBlock, BlockContext, ContractApi, ContractFault, ContractRuntime,
    ExecutionContext, ExecutionOutcome, FieldKind, NativeContract, NativeRuntime, PayloadObject,
    PayloadSchema, Transaction,
};

pub const TIMESTAMP: &str = "2019-06-01T12:00:00";

// =============================================================================
// Test Contracts
// =============================================================================

/// Balances plus a pending-unstake queue.
pub struct Tokens;

impl NativeContract for Tokens {
    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec::new("issue").with_schema(
                PayloadSchema::new()
                    .required("to", FieldKind::String)
                    .required("quantity", FieldKind::Number),
            ),
            ActionSpec::new("transfer").with_schema(
                PayloadSchema::new()
                    .required("to", FieldKind::String)
                    .required("quantity", FieldKind::Number),
            ),
            ActionSpec::new("unstake")
                .with_schema(PayloadSchema::new().required("quantity", FieldKind::Number)),
            ActionSpec::new("checkPendingUnstakes"),
            ActionSpec::new("checkPendingUndelegations"),
        ]
    }

    fn execute(
        &self,
        api: &mut ContractApi<'_>,
        action: &str,
        payload: &PayloadObject,
    ) -> Result<(), ContractFault> {
        match action {
            "createSSC" => {
                api.create_table("balances", &["account"])?;
                api.create_table("pendingUnstakes", &["account"])
            }
            "issue" => {
                if !api.assert(api.sender() == api.owner(), "not allowed to issue tokens") {
                    return Ok(());
                }
                let to = payload["to"].as_str().unwrap_or_default().to_string();
                let quantity = payload["quantity"].as_u64().unwrap_or(0);
                credit(api, &to, quantity)?;
                api.emit("issue", json!({ "to": to, "quantity": quantity }))
            }
            "transfer" => {
                let from = api.sender().to_string();
                let to = payload["to"].as_str().unwrap_or_default().to_string();
                let quantity = payload["quantity"].as_u64().unwrap_or(0);
                if !api.assert(from != to, "cannot transfer to self") {
                    return Ok(());
                }
                if !debit(api, &from, quantity)? {
                    return Ok(());
                }
                credit(api, &to, quantity)?;
                api.emit("transfer", json!({ "from": from, "to": to, "quantity": quantity }))
            }
            "unstake" => {
                let account = api.sender().to_string();
                let quantity = payload["quantity"].as_u64().unwrap_or(0);
                let doc = json!({ "account": account, "quantity": quantity });
                api.insert("pendingUnstakes", object(doc))?;
                Ok(())
            }
            "checkPendingUnstakes" => {
                for pending in api.find("pendingUnstakes", &Query::default())? {
                    let account = pending["account"].as_str().unwrap_or_default().to_string();
                    let quantity = pending["quantity"].as_u64().unwrap_or(0);
                    api.remove("pendingUnstakes", &pending)?;
                    api.emit("unstake", json!({ "account": account, "quantity": quantity }))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn balance_filter(account: &str) -> Filter {
    Filter::new().eq("account", account)
}

fn credit(api: &mut ContractApi<'_>, account: &str, quantity: u64) -> Result<(), ContractFault> {
    match api.find_one("balances", &balance_filter(account))? {
        Some(mut doc) => {
            let balance = doc["balance"].as_u64().unwrap_or(0) + quantity;
            doc.insert("balance".into(), json!(balance));
            api.update("balances", doc)
        }
        None => {
            api.insert("balances", object(json!({ "account": account, "balance": quantity })))?;
            Ok(())
        }
    }
}

fn debit(api: &mut ContractApi<'_>, account: &str, quantity: u64) -> Result<bool, ContractFault> {
    let doc = api.find_one("balances", &balance_filter(account))?;
    let balance = doc.as_ref().and_then(|d| d["balance"].as_u64()).unwrap_or(0);
    if !api.assert(balance >= quantity, "overdrawn balance") {
        return Ok(false);
    }
    if let Some(mut doc) = doc {
        doc.insert("balance".into(), json!(balance - quantity));
        api.update("balances", doc)?;
    }
    Ok(true)
}

/// Tokens contract from before unstaking existed: exports only `transfer`.
pub struct LegacyTokens;

impl NativeContract for LegacyTokens {
    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("transfer")]
    }

    fn execute(&self, _: &mut ContractApi<'_>, _: &str, _: &PayloadObject) -> Result<(), ContractFault> {
        Ok(())
    }
}

/// Emits a new witness schedule on every call.
pub struct Witnesses;

impl NativeContract for Witnesses {
    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("scheduleWitnesses")]
    }

    fn execute(
        &self,
        api: &mut ContractApi<'_>,
        action: &str,
        _: &PayloadObject,
    ) -> Result<(), ContractFault> {
        match action {
            "createSSC" => api.create_table("schedules", &["round"]),
            "scheduleWitnesses" => {
                let round = api.ref_block_number();
                api.insert("schedules", object(json!({ "round": round })))?;
                api.emit("newSchedule", json!({ "round": round }))
            }
            _ => Ok(()),
        }
    }
}

/// Witnesses build whose schedule is delegated to a `market` contract.
pub struct RelayWitnesses;

impl NativeContract for RelayWitnesses {
    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("scheduleWitnesses")]
    }

    fn execute(
        &self,
        api: &mut ContractApi<'_>,
        action: &str,
        _: &PayloadObject,
    ) -> Result<(), ContractFault> {
        if action == "scheduleWitnesses" {
            api.execute_contract("market", "tick", json!({}))?;
        }
        Ok(())
    }
}

/// Witnesses build that rejects every schedule with the generic error.
pub struct AssertingWitnesses;

impl NativeContract for AssertingWitnesses {
    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("scheduleWitnesses")]
    }

    fn execute(
        &self,
        api: &mut ContractApi<'_>,
        action: &str,
        _: &PayloadObject,
    ) -> Result<(), ContractFault> {
        if action == "scheduleWitnesses" {
            api.assert(false, messages::UNKNOWN_ERROR);
        }
        Ok(())
    }
}

/// Comments are no-ops; votes always fail.
pub struct Comments;

impl NativeContract for Comments {
    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("comment"), ActionSpec::new("vote")]
    }

    fn execute(
        &self,
        api: &mut ContractApi<'_>,
        action: &str,
        _: &PayloadObject,
    ) -> Result<(), ContractFault> {
        if action == "vote" {
            api.assert(false, "voting is closed");
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn object(value: Value) -> PayloadObject {
    value.as_object().cloned().unwrap_or_default()
}

pub fn runtime() -> NativeRuntime {
    NativeRuntime::new()
        .with_contract("tokens", Tokens)
        .with_contract("legacy-tokens", LegacyTokens)
        .with_contract("witnesses", Witnesses)
        .with_contract("witnesses-relay", RelayWitnesses)
        .with_contract("witnesses-assert", AssertingWitnesses)
        .with_contract("comments", Comments)
}

fn setup_context(tx: &Transaction) -> ExecutionContext {
    let (sender, contract, action) = tx.call_target().expect("complete transaction");
    let block = BlockContext {
        block_number: 0,
        ref_block_number: 0,
        timestamp: TIMESTAMP.to_string(),
        ref_block_id: String::new(),
        prev_ref_block_id: String::new(),
    };
    ExecutionContext::new(block, sender, contract, action, tx.transaction_id(), Duration::from_secs(5))
}

/// Deploy `code` as `name` outside of any block, owned by `steemsc`.
pub fn deploy(runtime: &NativeRuntime, store: &mut MemoryStore, name: &str, code: &str) {
    let tx = Transaction::new(
        0,
        format!("deploy-{name}"),
        "steemsc",
        "contract",
        "deploy",
        json!({ "name": name, "code": code }),
    );
    let result = runtime.deploy(store, &tx, &setup_context(&tx));
    assert_eq!(result.outcome, ExecutionOutcome::Success, "deploy {name}: {:?}", result.logs);
}

/// Credit `account` from the tokens owner, outside of any block.
pub fn issue(runtime: &NativeRuntime, store: &mut MemoryStore, account: &str, quantity: u64) {
    let tx = Transaction::new(
        0,
        format!("issue-{account}"),
        "steemsc",
        "tokens",
        "issue",
        json!({ "to": account, "quantity": quantity }),
    );
    let result = runtime.invoke(store, &tx, &setup_context(&tx));
    assert_eq!(result.outcome, ExecutionOutcome::Success, "issue: {:?}", result.logs);
}

pub fn anchor(ref_block_number: u64, transactions: Vec<Transaction>) -> AnchorBlock {
    AnchorBlock {
        ref_block_number,
        ref_block_id: format!("ref-{ref_block_number}"),
        prev_ref_block_id: format!("ref-{}", ref_block_number.saturating_sub(1)),
        timestamp: TIMESTAMP.to_string(),
        transactions,
    }
}

pub fn transfer(id: &str, from: &str, to: &str, quantity: u64) -> Transaction {
    Transaction::new(
        100,
        id,
        from,
        "tokens",
        "transfer",
        json!({ "to": to, "quantity": quantity }),
    )
}

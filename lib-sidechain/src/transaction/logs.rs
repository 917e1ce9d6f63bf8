//! Transaction execution logs and outcomes.
//!
//! Logs are consensus data: they are folded into the transaction hash as a
//! JSON string, so their textual form must be identical on every node.
//! Empty lists are omitted, `errors` precedes `events`, and an empty log
//! renders as `{}`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Canonical log messages. These strings are replayed bit-for-bit, never reword them.
pub mod messages {
    pub const MISSING_PARAMETERS: &str = "the parameters sender, contract and action are required";
    pub const DEPLOYMENT_UNAVAILABLE: &str = "the contract deployment is currently unavailable";
    pub const CONTRACT_MISSING: &str = "contract doesn't exist";
    pub const UNKNOWN_ERROR: &str = "unknown error";
    pub const RESERVED_ACTION: &str = "you cannot trigger the createSSC action";
    pub const CONTRACT_EXISTS: &str = "contract already exists";
    pub const UPDATE_NOT_ALLOWED: &str = "you are not allowed to update this contract";
    pub const INVALID_CONTRACT_NAME: &str = "invalid contract name";
    pub const UNKNOWN_CODE: &str = "unknown contract code";
    pub const TIMED_OUT: &str = "Error: Script execution timed out.";
}

/// JSON text of an empty log.
pub const EMPTY_LOGS: &str = "{}";

/// Event emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract: String,
    pub event: String,
    pub data: Value,
}

/// Errors and events produced while executing one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLogs {
    errors: Vec<String>,
    events: Vec<ContractEvent>,
}

#[derive(Serialize, Deserialize)]
struct LogsRepr {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    events: Vec<ContractEvent>,
}

impl TransactionLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log holding exactly one error and no events.
    pub fn single_error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            events: Vec::new(),
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn push_event(&mut self, event: ContractEvent) {
        self.events.push(event);
    }

    /// Append everything from `other`, preserving order.
    pub fn extend(&mut self, other: TransactionLogs) {
        self.errors.extend(other.errors);
        self.events.extend(other.events);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.events.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when the log is exactly `{"errors":[message]}`.
    pub fn is_single_error(&self, message: &str) -> bool {
        self.events.is_empty() && self.errors.len() == 1 && self.errors[0] == message
    }

    /// Canonical JSON text used in hashing.
    pub fn to_json(&self) -> String {
        let repr = LogsRepr {
            errors: self.errors.clone(),
            events: self.events.clone(),
        };
        serde_json::to_string(&repr).unwrap_or_else(|_| EMPTY_LOGS.to_string())
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let repr: LogsRepr = serde_json::from_str(text)?;
        Ok(Self {
            errors: repr.errors,
            events: repr.events,
        })
    }
}

// Logs travel as their JSON text so that block serialization matches the hash input.
impl Serialize for TransactionLogs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_json())
    }
}

impl<'de> Deserialize<'de> for TransactionLogs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TransactionLogs::from_json(&text).map_err(D::Error::custom)
    }
}

/// Why a transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Sender, contract or action was absent.
    MissingParameters,
    /// Deploy or update attempted by a sender outside the allow-list.
    DeploymentUnavailable,
    /// Direct call to the reserved initialiser action.
    ReservedAction,
    /// Payload was not a JSON object or failed the action's schema.
    InvalidPayload,
    /// Deploy or update rejected (name, ownership, unknown code).
    DeploymentRejected,
    /// The contract ran past its time budget.
    Timeout,
    /// Generic `unknown error`, raised for actions a contract does not export.
    Unknown,
    /// The contract itself logged errors or faulted.
    Contract,
}

/// Structured result of executing a transaction.
///
/// The log strings remain the consensus record; this enum is what block
/// assembly branches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Nothing was logged.
    NoOp,
    /// Events were emitted and no error was logged.
    Success,
    /// The target contract is not deployed on this chain.
    FeatureUnavailable { contract: String, action: String },
    Failure(FailureKind),
}

impl ExecutionOutcome {
    /// Classify a completed contract run from its logs.
    ///
    /// A log that is exactly the `unknown error` sentinel classifies as
    /// [`FailureKind::Unknown`] however it was produced.
    pub fn from_logs(logs: &TransactionLogs) -> Self {
        if logs.is_empty() {
            ExecutionOutcome::NoOp
        } else if logs.is_single_error(messages::UNKNOWN_ERROR) {
            ExecutionOutcome::Failure(FailureKind::Unknown)
        } else if logs.has_errors() {
            ExecutionOutcome::Failure(FailureKind::Contract)
        } else {
            ExecutionOutcome::Success
        }
    }

    /// Classify a completed call of `contract.action` from its final logs.
    ///
    /// Like [`from_logs`](Self::from_logs), but a log that is exactly the
    /// `contract doesn't exist` sentinel reports the called contract as
    /// unavailable, even when the message came from a nested call.
    pub fn from_call_logs(logs: &TransactionLogs, contract: &str, action: &str) -> Self {
        if logs.is_single_error(messages::CONTRACT_MISSING) {
            ExecutionOutcome::FeatureUnavailable {
                contract: contract.to_string(),
                action: action.to_string(),
            }
        } else {
            Self::from_logs(logs)
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ExecutionOutcome::NoOp)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::Failure(_) | ExecutionOutcome::FeatureUnavailable { .. }
        )
    }
}

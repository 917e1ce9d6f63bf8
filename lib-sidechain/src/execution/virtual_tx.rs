//! Virtual transaction scheduling.
//!
//! Virtual transactions are synthesized by every node at the end of a block
//! to drive periodic system actions (settling unstakes, scheduling witnesses,
//! issuing inflation). They are appended after the real transactions, run
//! through the same processor, and kept in the block only when they produced
//! an observable outcome.

use crate::protocol::ProtocolParams;
use crate::transaction::{ExecutionOutcome, FailureKind, Payload, Transaction};

/// Sender of every virtual transaction.
pub const VIRTUAL_SENDER: &str = "null";

/// Payload of the inflation issuance call.
pub const INFLATION_PAYLOAD: &str = r#"{ "isSignedWithActiveKey": true }"#;

/// Anchor heights at which an entry fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub from_height: u64,
    /// Only fire on multiples of this value
    pub every: Option<u64>,
}

impl Activation {
    pub const ALWAYS: Activation = Activation {
        from_height: 0,
        every: None,
    };

    pub fn from_height(height: u64) -> Self {
        Self {
            from_height: height,
            every: None,
        }
    }

    pub fn every(mut self, interval: u64) -> Self {
        self.every = Some(interval);
        self
    }

    pub fn is_active(&self, height: u64) -> bool {
        height >= self.from_height
            && match self.every {
                Some(0) => false,
                Some(n) => height % n == 0,
                None => true,
            }
    }
}

/// One row of the activation table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEntry {
    pub contract: String,
    pub action: String,
    pub payload: String,
    pub activation: Activation,
    /// Drop the transaction when its contract is not deployed on this chain
    pub dormant_when_missing: bool,
}

impl VirtualEntry {
    pub fn new(contract: &str, action: &str, activation: Activation) -> Self {
        Self {
            contract: contract.to_string(),
            action: action.to_string(),
            payload: String::new(),
            activation,
            dormant_when_missing: false,
        }
    }

    pub fn with_payload(mut self, payload: &str) -> Self {
        self.payload = payload.to_string();
        self
    }

    pub fn dormant_when_missing(mut self) -> Self {
        self.dormant_when_missing = true;
        self
    }

    /// Whether a processed transaction for this entry belongs in the block.
    ///
    /// Empty logs and the generic `unknown error` are never kept. A missing
    /// contract is kept only for entries that are not dormant.
    pub fn retains(&self, outcome: &ExecutionOutcome) -> bool {
        match outcome {
            ExecutionOutcome::NoOp => false,
            ExecutionOutcome::Failure(FailureKind::Unknown) => false,
            ExecutionOutcome::FeatureUnavailable { .. } => !self.dormant_when_missing,
            ExecutionOutcome::Success | ExecutionOutcome::Failure(_) => true,
        }
    }
}

/// Ordered activation table. Entry order is execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationSchedule {
    entries: Vec<VirtualEntry>,
}

impl ActivationSchedule {
    pub fn new(entries: Vec<VirtualEntry>) -> Self {
        Self { entries }
    }

    pub fn from_params(params: &ProtocolParams) -> Self {
        let unstakes = Activation::from_height(params.pending_unstakes_from_height);
        Self::new(vec![
            VirtualEntry::new("tokens", "checkPendingUnstakes", unstakes),
            VirtualEntry::new("tokens", "checkPendingUndelegations", unstakes),
            VirtualEntry::new("witnesses", "scheduleWitnesses", Activation::ALWAYS)
                .dormant_when_missing(),
            VirtualEntry::new(
                "inflation",
                "issueNewTokens",
                Activation::from_height(params.inflation_from_height)
                    .every(params.inflation_interval),
            )
            .with_payload(INFLATION_PAYLOAD)
            .dormant_when_missing(),
            VirtualEntry::new(
                "nft",
                "checkPendingUndelegations",
                Activation::from_height(params.nft_undelegations_from_height),
            )
            .dormant_when_missing(),
        ])
    }

    pub fn entries(&self) -> &[VirtualEntry] {
        &self.entries
    }
}

impl Default for ActivationSchedule {
    fn default() -> Self {
        Self::from_params(&ProtocolParams::mainnet())
    }
}

/// A virtual transaction and the table row that produced it
#[derive(Debug, Clone)]
pub struct ScheduledTransaction<'a> {
    pub transaction: Transaction,
    pub entry: &'a VirtualEntry,
}

/// Produces the virtual transactions due at an anchor height
#[derive(Debug, Clone, Default)]
pub struct VirtualTransactionScheduler {
    schedule: ActivationSchedule,
}

impl VirtualTransactionScheduler {
    pub fn new(schedule: ActivationSchedule) -> Self {
        Self { schedule }
    }

    pub fn from_params(params: &ProtocolParams) -> Self {
        Self::new(ActivationSchedule::from_params(params))
    }

    pub fn activation_schedule(&self) -> &ActivationSchedule {
        &self.schedule
    }

    /// Virtual transactions due at `anchor_height`, numbered `<height>-<index>` in table order.
    pub fn schedule(&self, anchor_height: u64) -> Vec<ScheduledTransaction<'_>> {
        self.schedule
            .entries
            .iter()
            .filter(|entry| entry.activation.is_active(anchor_height))
            .enumerate()
            .map(|(index, entry)| ScheduledTransaction {
                transaction: Transaction::new(
                    anchor_height,
                    format!("{anchor_height}-{index}"),
                    VIRTUAL_SENDER,
                    &entry.contract,
                    &entry.action,
                    Payload::new(entry.payload.as_str()),
                ),
                entry,
            })
            .collect()
    }
}

//! Sidechain Block Production Package
//!
//! Replicated state-machine core of a sidechain anchored to an external
//! blockchain. Every node replays the transactions carried by anchor blocks
//! against its local store and must arrive at byte-identical hashes; there is
//! no message-passing consensus, only deterministic re-execution.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`types`] | SHA-256 hex digests |
//! | [`transaction`] | Transaction envelope, payloads, logs and outcomes |
//! | [`storage`] | State store trait, in-memory store, sled block log |
//! | [`contracts`] | Contract runtime seam and the native runtime |
//! | [`execution`] | Transaction processor, virtual scheduler, Merkle fold |
//! | [`block`] | Block structures and the block producer |
//! | [`chain`] | Append-only chain with link verification |
//! | [`config`] | TOML configuration |
//! | [`protocol`] | Activation heights |

pub mod block;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod execution;
pub mod protocol;
pub mod storage;
pub mod transaction;
pub mod types;

// Types module
pub use types::{sha256_hex, sha256_hex_concat, EMPTY_ROOT};

// Transaction module
pub use transaction::{
    messages, ContractEvent, ExecutionOutcome, FailureKind, FieldKind, Payload, PayloadError,
    PayloadObject, PayloadSchema, Transaction, TransactionLogs, EMPTY_LOGS,
};

// Block module
pub use block::{AnchorBlock, Block, BlockProducer, SealedBlock, COMMENTS_CONTRACT, GENESIS_TIMESTAMP};

// Chain module
pub use chain::{Chain, ChainError, ChainResult};

// Configuration
pub use config::{ChainConfig, ConfigError, ProducerConfig};

// Protocol module
pub use protocol::{ProtocolError, ProtocolParams, ProtocolResult};

// Storage layer
pub use storage::{
    Document, Filter, MemoryStore, Query, SledBlockLog, SortOrder, StateStore, StorageError,
    StorageResult, MAX_PAGE_SIZE,
};

// Execution layer
pub use execution::{
    fold, ActivationSchedule, BlockProductionError, MerkleRoots, ProductionResult,
    TransactionProcessor, VirtualTransactionScheduler,
};

// Contracts
pub use contracts::{
    ActionSpec, BlockContext, ContractApi, ContractFault, ContractRuntime, ExecutionContext,
    ExecutionResult, NativeContract, NativeRuntime,
};

/// Sidechain protocol version.
///
/// Bump on any change to hash inputs, log strings, the Merkle pairing rule
/// or the virtual activation table; nodes on different versions diverge.
pub const SIDECHAIN_PROTOCOL_VERSION: u32 = 1;


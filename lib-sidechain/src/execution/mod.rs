//! Block Execution Module
//!
//! Everything between a built block and its sealed form.
//!
//! ```text
//! BlockProducer (block::producer)
//!     │
//!     ├── TransactionProcessor   one transaction, one hash epoch
//!     ├── VirtualTransactionScheduler   activation table → synthetic calls
//!     └── merkle::fold           (tx_root, state_root)
//! ```
//!
//! # Invariants
//!
//! - Strictly sequential: each transaction starts from the previous one's state hash
//! - Deterministic: same block + same store = same hashes on every node
//! - Only store-epoch failures abort a block

pub mod errors;
pub mod merkle;
pub mod processor;
pub mod virtual_tx;

pub use errors::{BlockProductionError, ProductionResult};
pub use merkle::{fold, MerkleRoots};
pub use processor::TransactionProcessor;
pub use virtual_tx::{
    Activation, ActivationSchedule, ScheduledTransaction, VirtualEntry,
    VirtualTransactionScheduler, INFLATION_PAYLOAD, VIRTUAL_SENDER,
};

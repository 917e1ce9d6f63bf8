//! Transaction envelope
//!
//! The envelope, its payload and the execution logs that are folded into its hash.

pub mod core;
pub mod logs;
pub mod payload;

pub use self::core::Transaction;
pub use logs::{messages, ContractEvent, ExecutionOutcome, FailureKind, TransactionLogs, EMPTY_LOGS};
pub use payload::{FieldKind, FieldSpec, Payload, PayloadError, PayloadObject, PayloadSchema};

//! Contract fault type.
//!
//! The `Display` form of a fault is the exact error string written to the
//! transaction logs.

use thiserror::Error;

use crate::storage::StorageError;

/// Abnormal termination of a contract action
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractFault {
    #[error("Error: Script execution timed out.")]
    Timeout,

    #[error("{name}: {message}")]
    Raised { name: String, message: String },

    #[error("Error: {0}")]
    Store(#[from] StorageError),
}

impl ContractFault {
    /// A generic `Error: <message>` fault.
    pub fn error(message: impl Into<String>) -> Self {
        ContractFault::Raised {
            name: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ContractFault::Timeout)
    }
}

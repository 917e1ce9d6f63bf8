//! State Storage Layer
//!
//! Contracts read and write state exclusively through the [`StateStore`]
//! trait. The store is a set of named tables holding JSON documents keyed by
//! a store-assigned `_id`.
//!
//! # Hash Epochs
//!
//! Every mutation is folded into a running content hash so that two nodes
//! replaying the same transactions can compare state with one string:
//!
//! ```text
//! begin_hash_epoch(prior)      epoch = prior
//! insert/update/remove(doc)    epoch = sha256(epoch ++ json(doc))
//! current_epoch_hash()         -> epoch
//! ```
//!
//! # Invariants
//!
//! 1. **Single writer** - the store is owned by the block producer for the
//!    duration of a block; mutation takes `&mut self`.
//! 2. **Deterministic documents** - documents serialize with sorted keys, so
//!    the same mutation always folds to the same hash.
//! 3. **Epoch before read** - reading the epoch hash before one was opened is
//!    an error, never an implicit empty hash.

pub mod block_log;
pub mod keys;
pub mod memory;
pub mod query;

use serde_json::{Map, Value};
use thiserror::Error;

pub use block_log::SledBlockLog;
pub use memory::MemoryStore;
pub use query::{compare_values, sort_order, Condition, Filter, Query, SortOrder, MAX_PAGE_SIZE};

/// A stored JSON document. Keys are kept sorted.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned document id.
pub const ID_FIELD: &str = "_id";

/// Storage layer result type
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Document not found in {table}: _id {id}")]
    DocumentNotFound { table: String, id: u64 },

    #[error("Document has no valid _id")]
    MissingId,

    #[error("Hash epoch not started")]
    EpochNotStarted,

    #[error("Block height mismatch: expected {expected}, got {actual}")]
    HeightMismatch { expected: u64, actual: u64 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Read the `_id` of a stored document.
pub fn document_id(doc: &Document) -> Option<u64> {
    doc.get(ID_FIELD).and_then(Value::as_u64)
}

// =============================================================================
// STORE CONTRACT
// =============================================================================

/// Table/document store with a running content hash.
pub trait StateStore {
    fn table_exists(&self, table: &str) -> bool;

    /// Create an empty table. `indexes` name the fields callers expect to filter on.
    fn create_table(&mut self, table: &str, indexes: &[&str]) -> StorageResult<()>;

    /// First matching document in `_id` order.
    fn find_one(&self, table: &str, filter: &Filter) -> StorageResult<Option<Document>>;

    /// Matching documents, sorted then paged. The limit is clamped to [`MAX_PAGE_SIZE`].
    fn find(&self, table: &str, query: &Query) -> StorageResult<Vec<Document>>;

    /// Insert a document, returning it with its assigned `_id`.
    fn insert(&mut self, table: &str, doc: Document) -> StorageResult<Document>;

    /// Replace the document with the same `_id`.
    fn update(&mut self, table: &str, doc: Document) -> StorageResult<()>;

    /// Remove the document with the same `_id`.
    fn remove(&mut self, table: &str, doc: &Document) -> StorageResult<()>;

    /// Start a new hash epoch seeded with the previous state hash.
    fn begin_hash_epoch(&mut self, prior: &str) -> StorageResult<()>;

    /// Hash after every mutation since the epoch began.
    fn current_epoch_hash(&self) -> StorageResult<String>;
}

//! Block module
//!
//! Block structures and the producer that executes and seals them.

pub mod core;
pub mod producer;

pub use self::core::{
    transactions_json, AnchorBlock, Block, SealedBlock, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP,
};
pub use producer::{BlockProducer, COMMENTS_CONTRACT};

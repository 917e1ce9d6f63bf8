//! Core types shared across the sidechain.
//!
//! Digests are carried as lowercase hex strings because the consensus hashes
//! are computed over textual concatenations, not raw bytes.

pub mod hash;

pub use hash::{sha256_hex, sha256_hex_concat, EMPTY_ROOT};

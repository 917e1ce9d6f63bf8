//! Pairwise hash fold over `(tx_hash, state_hash)` pairs.
//!
//! ```text
//! level 0:  a      b      c
//! level 1:  H(a+b)        H(c+c)
//! level 2:  H(H(a+b) + H(c+c))
//! ```
//!
//! Transaction hashes and state hashes are folded independently with the same
//! pairing. Hex strings are concatenated, then hashed. A lone element is its
//! own root.

use crate::types::{sha256_hex_concat, EMPTY_ROOT};

/// One node of the fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleRoots {
    pub tx_root: String,
    pub state_root: String,
}

impl MerkleRoots {
    pub fn empty() -> Self {
        Self {
            tx_root: EMPTY_ROOT.to_string(),
            state_root: EMPTY_ROOT.to_string(),
        }
    }
}

/// Fold `leaves` (in order) down to a single root pair.
pub fn fold<T, S>(leaves: &[(T, S)]) -> MerkleRoots
where
    T: AsRef<str>,
    S: AsRef<str>,
{
    let mut level: Vec<(String, String)> = leaves
        .iter()
        .map(|(tx, state)| (tx.as_ref().to_string(), state.as_ref().to_string()))
        .collect();

    if level.is_empty() {
        return MerkleRoots::empty();
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                (
                    sha256_hex_concat(&[&left.0, &right.0]),
                    sha256_hex_concat(&[&left.1, &right.1]),
                )
            })
            .collect();
    }

    let (tx_root, state_root) = level.swap_remove(0);
    MerkleRoots { tx_root, state_root }
}

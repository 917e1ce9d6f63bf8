//! SHA-256 helpers used by every consensus hash in the crate.
//!
//! All inputs are strings and all outputs are lowercase hex. Concatenation
//! happens *before* hashing: `sha256_hex_concat(&[a, b])` equals
//! `sha256_hex(&(a.to_owned() + b))`.

use sha2::{Digest, Sha256};

/// Sentinel for an absent root (empty block, unprocessed transaction).
pub const EMPTY_ROOT: &str = "";

/// Hex-encoded SHA-256 of a UTF-8 string.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Hex-encoded SHA-256 of the concatenation of `parts`, without allocating the joined string.
pub fn sha256_hex_concat(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_concat_matches_joined_input() {
        let joined = sha256_hex("previousstate12");
        assert_eq!(sha256_hex_concat(&["previous", "state", "1", "2"]), joined);
        assert_eq!(sha256_hex_concat(&[]), sha256_hex(""));
    }

    #[test]
    fn test_output_is_lowercase_hex() {
        let digest = sha256_hex("sidechain");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

//! Key Encoding Helpers
//!
//! Key encoding is PROTOCOL. Heights are big-endian u64 so that sled's
//! lexicographic key order is numeric order.

/// Key for the blocks_by_height tree: height (8 bytes BE) → sealed block bytes
#[inline]
pub fn block_height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// Decode a height key written by [`block_height_key`].
#[inline]
pub fn parse_block_height_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

pub mod meta {
    /// Height of the newest block in the log
    pub const LATEST_HEIGHT: &[u8] = b"latest_height";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_keys_sort_numerically() {
        let mut keys = vec![block_height_key(256), block_height_key(1), block_height_key(255)];
        keys.sort();
        let heights: Vec<u64> = keys.iter().filter_map(|k| parse_block_height_key(k)).collect();
        assert_eq!(heights, vec![1, 255, 256]);
    }

    #[test]
    fn test_bad_key_length() {
        assert_eq!(parse_block_height_key(&[1, 2, 3]), None);
    }
}

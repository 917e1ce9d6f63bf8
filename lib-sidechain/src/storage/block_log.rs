//! Sled-backed append-only log of sealed blocks.
//!
//! Blocks are written once, in height order, and never modified.

use std::path::Path;

use sled::{Db, Tree};
use tracing::debug;

use super::{keys, StorageError, StorageResult};
use crate::block::SealedBlock;

// =============================================================================
// TREE NAMES (FIXED - DO NOT CHANGE)
// =============================================================================

const TREE_BLOCKS_BY_HEIGHT: &str = "blocks_by_height";
const TREE_META: &str = "meta";

/// Persistent block log
pub struct SledBlockLog {
    db: Db,
    blocks_by_height: Tree,
    meta: Tree,
}

impl std::fmt::Debug for SledBlockLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledBlockLog")
            .field("blocks", &self.blocks_by_height.len())
            .finish_non_exhaustive()
    }
}

impl SledBlockLog {
    /// Open or create a block log at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// Open a log that is discarded on drop
    pub fn open_temporary() -> StorageResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> StorageResult<Self> {
        let blocks_by_height = db.open_tree(TREE_BLOCKS_BY_HEIGHT)?;
        let meta = db.open_tree(TREE_META)?;
        Ok(Self {
            db,
            blocks_by_height,
            meta,
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> StorageResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
        bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Height of the newest block, or None if the log is empty
    pub fn latest_height(&self) -> StorageResult<Option<u64>> {
        match self.meta.get(keys::meta::LATEST_HEIGHT)? {
            Some(bytes) => keys::parse_block_height_key(&bytes)
                .map(Some)
                .ok_or_else(|| StorageError::CorruptedData("Invalid latest_height length".to_string())),
            None => Ok(None),
        }
    }

    /// Append the next block. Heights must be contiguous from genesis (0).
    pub fn append(&self, block: &SealedBlock) -> StorageResult<()> {
        let expected = match self.latest_height()? {
            Some(h) => h + 1,
            None => 0,
        };
        if block.block_number != expected {
            return Err(StorageError::HeightMismatch {
                expected,
                actual: block.block_number,
            });
        }

        let bytes = Self::serialize(block)?;
        let key = keys::block_height_key(block.block_number);
        self.blocks_by_height.insert(key, bytes)?;
        self.meta.insert(keys::meta::LATEST_HEIGHT, &key[..])?;
        debug!(height = block.block_number, hash = %block.hash, "block appended to log");
        Ok(())
    }

    pub fn get_by_height(&self, height: u64) -> StorageResult<Option<SealedBlock>> {
        match self.blocks_by_height.get(keys::block_height_key(height))? {
            Some(bytes) => Ok(Some(Self::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn latest(&self) -> StorageResult<Option<SealedBlock>> {
        match self.latest_height()? {
            Some(h) => self.get_by_height(h),
            None => Ok(None),
        }
    }

    /// Iterate blocks in height order
    pub fn iter(&self) -> impl Iterator<Item = StorageResult<SealedBlock>> + '_ {
        self.blocks_by_height
            .iter()
            .values()
            .map(|entry| entry.map_err(StorageError::from).and_then(|bytes| Self::deserialize(&bytes)))
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// storage/src/db.rs

use crate::{PruningMode, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use staking_core::{BlockNumber, EpochNumber};

/// Named sled trees
#[derive(Debug, Clone, Copy)]
pub enum StoreTree {
    Checkpoints,
    CheckpointMeta,
    Meta,
}

impl StoreTree {
    fn as_str(&self) -> &'static str {
        match self {
            StoreTree::Checkpoints => "checkpoints",
            StoreTree::CheckpointMeta => "checkpoint_meta",
            StoreTree::Meta => "meta",
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub cache_capacity: u64,
    pub flush_every_ms: Option<u64>,
    pub pruning_mode: PruningMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
            cache_capacity: 64 * 1024 * 1024, // 64 MB
            flush_every_ms: Some(500),
            pruning_mode: PruningMode::KeepLast(16),
        }
    }
}

/// Human-readable description of a stored checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub block: BlockNumber,
    pub epoch: EpochNumber,
    pub size_bytes: u64,
    pub written_at: DateTime<Utc>,
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub latest_block: Option<BlockNumber>,
    pub checkpoints: u64,
    pub size_on_disk: u64,
    pub pruning_mode: PruningMode,
}

/// Checkpoint store: bincode state snapshots keyed by big-endian block number
pub struct StateStore {
    db: sled::Db,
    config: StoreConfig,
}

impl StateStore {
    /// Open or create the store
    pub fn open(config: StoreConfig) -> StorageResult<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_every_ms)
            .open()?;

        tracing::info!("State store opened at {}", config.path);
        Ok(Self { db, config })
    }

    /// Open a store that lives only as long as the handle
    pub fn temporary() -> StorageResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            config: StoreConfig {
                path: String::new(),
                ..Default::default()
            },
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ==================== CHECKPOINT OPERATIONS ====================

    /// Persist `state` as the checkpoint of `block` and apply the pruning mode
    pub fn save_checkpoint<T: Serialize>(
        &self,
        block: BlockNumber,
        epoch: EpochNumber,
        state: &T,
    ) -> StorageResult<CheckpointMeta> {
        let bytes = bincode::serialize(state)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let meta = CheckpointMeta {
            block,
            epoch,
            size_bytes: bytes.len() as u64,
            written_at: Utc::now(),
        };
        let meta_bytes = serde_json::to_vec(&meta)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let key = block.to_be_bytes();
        self.tree(StoreTree::Checkpoints)?.insert(key, bytes)?;
        self.tree(StoreTree::CheckpointMeta)?.insert(key, meta_bytes)?;
        self.tree(StoreTree::Meta)?
            .insert(b"latest_checkpoint", key.to_vec())?;
        self.db.flush()?;

        tracing::debug!(block, epoch, size = meta.size_bytes, "checkpoint saved");

        if let PruningMode::KeepLast(keep) = self.config.pruning_mode {
            self.prune(keep)?;
        }
        Ok(meta)
    }

    /// Load the checkpoint stored for exactly `block`
    pub fn load_at<T: DeserializeOwned>(&self, block: BlockNumber) -> StorageResult<Option<T>> {
        match self.tree(StoreTree::Checkpoints)?.get(block.to_be_bytes())? {
            Some(bytes) => {
                let state = bincode::deserialize(&bytes)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Load the most recent checkpoint with its block number
    pub fn load_latest<T: DeserializeOwned>(&self) -> StorageResult<Option<(BlockNumber, T)>> {
        let Some(block) = self.latest_block()? else {
            return Ok(None);
        };
        match self.load_at(block)? {
            Some(state) => Ok(Some((block, state))),
            None => Err(StorageError::Corruption(format!(
                "latest checkpoint #{} has no state",
                block
            ))),
        }
    }

    pub fn checkpoint_meta(&self, block: BlockNumber) -> StorageResult<Option<CheckpointMeta>> {
        match self.tree(StoreTree::CheckpointMeta)?.get(block.to_be_bytes())? {
            Some(bytes) => {
                let meta = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    /// Block numbers of all stored checkpoints, ascending
    pub fn checkpoint_blocks(&self) -> StorageResult<Vec<BlockNumber>> {
        self.tree(StoreTree::Checkpoints)?
            .iter()
            .keys()
            .map(|key| decode_block(&key?))
            .collect()
    }

    pub fn latest_block(&self) -> StorageResult<Option<BlockNumber>> {
        match self.tree(StoreTree::Meta)?.get(b"latest_checkpoint")? {
            Some(bytes) => Ok(Some(decode_block(&bytes)?)),
            None => Ok(None),
        }
    }

    // ==================== PRUNING OPERATIONS ====================

    /// Keep only the `keep` most recent checkpoints; returns how many were removed
    pub fn prune(&self, keep: usize) -> StorageResult<u64> {
        let blocks = self.checkpoint_blocks()?;
        if blocks.len() <= keep {
            return Ok(0);
        }
        let checkpoints = self.tree(StoreTree::Checkpoints)?;
        let metas = self.tree(StoreTree::CheckpointMeta)?;

        let mut pruned = 0u64;
        for block in &blocks[..blocks.len() - keep] {
            checkpoints.remove(block.to_be_bytes())?;
            metas.remove(block.to_be_bytes())?;
            pruned += 1;
        }
        tracing::info!("Pruned {} checkpoints", pruned);
        Ok(pruned)
    }

    // ==================== UTILITY OPERATIONS ====================

    pub fn stats(&self) -> StorageResult<StoreStats> {
        Ok(StoreStats {
            latest_block: self.latest_block()?,
            checkpoints: self.tree(StoreTree::Checkpoints)?.len() as u64,
            size_on_disk: self.db.size_on_disk()?,
            pruning_mode: self.config.pruning_mode,
        })
    }

    fn tree(&self, tree: StoreTree) -> StorageResult<sled::Tree> {
        Ok(self.db.open_tree(tree.as_str())?)
    }
}

fn decode_block(bytes: &[u8]) -> StorageResult<BlockNumber> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::Corruption("Invalid block number key".into()))?;
    Ok(BlockNumber::from_be_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        epoch: u64,
        stakes: BTreeMap<String, u64>,
    }

    fn sample(epoch: u64) -> Sample {
        let mut stakes = BTreeMap::new();
        stakes.insert("pool-a".to_string(), 100 * (epoch + 1));
        Sample { epoch, stakes }
    }

    fn create_test_store(pruning_mode: PruningMode) -> (StateStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            path: temp_dir.path().to_str().unwrap().to_string(),
            pruning_mode,
            ..Default::default()
        };
        let store = StateStore::open(config).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_save_and_load_latest() {
        let (store, _temp) = create_test_store(PruningMode::Archive);
        assert!(store.load_latest::<Sample>().unwrap().is_none());

        store.save_checkpoint(10, 0, &sample(0)).unwrap();
        store.save_checkpoint(20, 1, &sample(1)).unwrap();

        let (block, state) = store.load_latest::<Sample>().unwrap().unwrap();
        assert_eq!(block, 20);
        assert_eq!(state, sample(1));
        assert_eq!(store.load_at::<Sample>(10).unwrap(), Some(sample(0)));
        assert!(store.load_at::<Sample>(15).unwrap().is_none());

        let meta = store.checkpoint_meta(20).unwrap().unwrap();
        assert_eq!(meta.epoch, 1);
        assert!(meta.size_bytes > 0);
    }

    #[test]
    fn test_checkpoint_keys_sort_numerically() {
        let (store, _temp) = create_test_store(PruningMode::Archive);
        for block in [300u64, 2, 1_000, 45] {
            store.save_checkpoint(block, 0, &sample(block)).unwrap();
        }
        assert_eq!(store.checkpoint_blocks().unwrap(), vec![2, 45, 300, 1_000]);
    }

    #[test]
    fn test_pruning_keeps_latest() {
        let (store, _temp) = create_test_store(PruningMode::KeepLast(2));
        for block in 1..=5u64 {
            store.save_checkpoint(block, 0, &sample(block)).unwrap();
        }
        assert_eq!(store.checkpoint_blocks().unwrap(), vec![4, 5]);
        assert!(store.checkpoint_meta(1).unwrap().is_none());
        assert_eq!(store.stats().unwrap().checkpoints, 2);
    }

    #[test]
    fn test_reopen_preserves_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            path: temp_dir.path().to_str().unwrap().to_string(),
            flush_every_ms: None,
            ..Default::default()
        };
        {
            let store = StateStore::open(config.clone()).unwrap();
            store.save_checkpoint(7, 3, &sample(3)).unwrap();
        }
        let store = StateStore::open(config).unwrap();
        assert_eq!(store.latest_block().unwrap(), Some(7));
        assert_eq!(store.load_latest::<Sample>().unwrap().unwrap().1, sample(3));
    }

    #[test]
    fn test_temporary_store() {
        let store = StateStore::temporary().unwrap();
        store.save_checkpoint(1, 0, &sample(0)).unwrap();
        assert_eq!(store.latest_block().unwrap(), Some(1));
    }
}

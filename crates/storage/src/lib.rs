// storage/src/lib.rs

//! Persistent Storage Layer
//!
//! This crate provides checkpoint persistence using sled:
//! - Whole-state checkpoints keyed by block number
//! - Checkpoint metadata for inspection
//! - Pruning of old checkpoints

pub mod db;

pub use db::{CheckpointMeta, StateStore, StoreConfig, StoreStats, StoreTree};

use serde::{Deserialize, Serialize};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Pruning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PruningMode {
    /// Keep every checkpoint
    Archive,
    /// Keep the most recent N checkpoints
    KeepLast(usize),
}

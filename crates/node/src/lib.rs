// node/src/lib.rs

//! Host-facing staking runtime
//!
//! Wires the stake ledger, random beacon, validator set manager and reward
//! distributor together per block, with TOML configuration, tracing setup
//! and checkpoint persistence.

pub mod config;
pub mod logging;
pub mod runtime;

pub use config::NodeConfig;
pub use logging::init_tracing;
pub use runtime::{BlockOutcome, GenesisValidator, StakingRuntime, StakingState};

use consensus::ConsensusError;
use stake_ledger::LedgerError;
use staking_core::CoreError;
use storage::StorageError;
use tokenomics::TokenomicsError;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced to the host
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Tokenomics error: {0}")]
    Tokenomics(#[from] TokenomicsError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

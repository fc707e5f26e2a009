// tokenomics/src/lib.rs

//! Epoch reward accounting
//!
//! This crate implements:
//! - Per-block productivity tally of the current validators
//! - Bridge fee accrual and optional token inflation
//! - Stake snapshots frozen at epoch boundaries
//! - Validator/delegator reward split and per-staker claims
//!
//! Rewards that cannot be paid in an epoch carry over to the next one.

pub mod rewards;
pub mod shares;

pub use rewards::{
    PoolSnapshot, RewardAccumulator, RewardDistributor, RewardSnapshot, SettlementReport,
    StakerReward,
};
pub use shares::{split_pool_reward, validator_min_percent, PoolRewardSplit};

use staking_core::{BlockNumber, CoreError, EpochNumber, TokenError};
use staking_crypto::Address;

/// Result type for tokenomics operations
pub type TokenomicsResult<T> = Result<T, TokenomicsError>;

/// Errors that can occur in tokenomics operations
#[derive(Debug, thiserror::Error)]
pub enum TokenomicsError {
    #[error("Amount must be positive")]
    ZeroAmount,

    #[error("Block creator {0} is not a known validator")]
    UnknownValidator(Address),

    #[error("Unknown pool {0}")]
    UnknownPool(Address),

    #[error("Block {block} already tallied (last tallied block {last})")]
    NonMonotonicTally { block: BlockNumber, last: BlockNumber },

    #[error("Block {block} is past the end of epoch {epoch} (last block {end_block})")]
    EpochEnded {
        block: BlockNumber,
        epoch: EpochNumber,
        end_block: BlockNumber,
    },

    #[error("Epoch {0} already settled")]
    EpochAlreadySettled(EpochNumber),

    #[error("Epochs settle in order: expected {expected}, got {got}")]
    EpochOutOfOrder { expected: EpochNumber, got: EpochNumber },

    #[error("Epoch {epoch} ends at block {end_block} but only {last_tallied} blocks were tallied")]
    EpochNotTallied {
        epoch: EpochNumber,
        end_block: BlockNumber,
        last_tallied: BlockNumber,
    },

    #[error("Snapshot for epoch {0} already taken")]
    SnapshotAlreadyTaken(EpochNumber),

    #[error("No snapshot for epoch {0}")]
    MissingSnapshot(EpochNumber),

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Reward of pool {pool} for epoch {epoch} already claimed")]
    AlreadyClaimed { epoch: EpochNumber, pool: Address },

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

// staking-core/src/epoch.rs

use crate::types::{BlockNumber, EpochNumber};
use serde::{Deserialize, Serialize};

/// A fixed-length window of blocks. Exactly one epoch is current at any height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingEpoch {
    pub number: EpochNumber,
    pub start_block: BlockNumber,
    pub duration_blocks: u64,
}

impl StakingEpoch {
    /// The genesis epoch starts at block 1
    pub fn genesis(duration_blocks: u64) -> Self {
        Self {
            number: 0,
            start_block: 1,
            duration_blocks,
        }
    }

    /// Last block that belongs to this epoch
    pub fn end_block(&self) -> BlockNumber {
        self.start_block + self.duration_blocks.saturating_sub(1)
    }

    pub fn contains(&self, block: BlockNumber) -> bool {
        block >= self.start_block && block <= self.end_block()
    }

    pub fn is_last_block(&self, block: BlockNumber) -> bool {
        block == self.end_block()
    }

    /// Staking and withdrawing are allowed up to and including
    /// `end_block - disallow_period`.
    pub fn stake_withdraw_allowed(&self, block: BlockNumber, disallow_period: u64) -> bool {
        self.contains(block) && block + disallow_period <= self.end_block()
    }

    /// The epoch that follows this one, starting at `start_block`
    pub fn next(&self, start_block: BlockNumber) -> Self {
        Self {
            number: self.number + 1,
            start_block,
            duration_blocks: self.duration_blocks,
        }
    }
}

// staking-core/src/params.rs

use crate::{types::StakeAmount, CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Validator's minimum share of its pool reward.
///
/// The default is a flat 30%. An early-epoch bonus is opt-in: with
/// `initial_percent` above the floor and a non-zero `decay_epochs`, the
/// share starts at `initial_percent` in epoch 0 and falls to
/// `floor_percent` after `decay_epochs` epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRewardCurve {
    pub floor_percent: u64,
    pub initial_percent: u64,
    pub decay_epochs: u64,
}

impl Default for ValidatorRewardCurve {
    fn default() -> Self {
        Self {
            floor_percent: 30,
            initial_percent: 30,
            decay_epochs: 0,
        }
    }
}

/// Protocol constants shared by every staking component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// Staking epoch length in blocks
    pub epoch_duration: u64,
    /// Blocks at the end of each epoch during which stake cannot move
    pub stake_withdraw_disallow_period: u64,
    /// Random beacon round length in blocks (commit half + reveal half)
    pub collect_round_length: u64,
    /// Minimum own stake of a pool
    pub candidate_min_stake: StakeAmount,
    /// Minimum position of a delegator
    pub delegator_min_stake: StakeAmount,
    /// Validator set size K
    pub max_validators: usize,
    /// Upper bound on registered pools
    pub max_candidates: usize,
    /// Upper bound on delegators per pool
    pub max_delegators_per_pool: usize,
    /// Ban length for an ejected validator, in blocks
    pub validator_ban_duration: u64,
    /// Withdrawal ban length for the delegators of an ejected validator
    pub delegators_ban_duration: u64,
    /// Oldest block (relative to the current one) a malice report may reference
    pub malice_report_max_age: u64,
    /// Validator/delegator reward split curve
    pub reward_curve: ValidatorRewardCurve,
    /// Annual token inflation on snapshotted stake, in basis points
    pub token_inflation_bps: u64,
    /// Blocks per year, used to pro-rate inflation per epoch
    pub blocks_per_year: u64,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            epoch_duration: 120_960,                // 1 week at 5s blocks
            stake_withdraw_disallow_period: 4_320, // 6 hours
            collect_round_length: 120,
            candidate_min_stake: StakeAmount::from_tokens(20_000),
            delegator_min_stake: StakeAmount::from_tokens(1_000),
            max_validators: 19,
            max_candidates: 3_000,
            max_delegators_per_pool: 200,
            validator_ban_duration: 1_555_200,     // ~90 days
            delegators_ban_duration: 241_920,      // two epochs
            malice_report_max_age: 100,
            reward_curve: ValidatorRewardCurve::default(),
            token_inflation_bps: 0,
            blocks_per_year: 6_307_200,
        }
    }
}

impl StakingParams {
    /// Reject combinations the components cannot run with
    pub fn validate(&self) -> CoreResult<()> {
        if self.epoch_duration == 0 {
            return Err(CoreError::InvalidParams("epoch_duration must be positive".into()));
        }
        if self.collect_round_length == 0 || self.collect_round_length % 2 != 0 {
            return Err(CoreError::InvalidParams(
                "collect_round_length must be positive and even".into(),
            ));
        }
        if self.epoch_duration % self.collect_round_length != 0 {
            return Err(CoreError::InvalidParams(format!(
                "epoch_duration {} is not a multiple of collect_round_length {}",
                self.epoch_duration, self.collect_round_length
            )));
        }
        if self.stake_withdraw_disallow_period >= self.epoch_duration {
            return Err(CoreError::InvalidParams(
                "stake_withdraw_disallow_period must be shorter than an epoch".into(),
            ));
        }
        if self.max_validators == 0 {
            return Err(CoreError::InvalidParams("max_validators must be positive".into()));
        }
        if self.max_candidates < self.max_validators {
            return Err(CoreError::InvalidParams(
                "max_candidates must be at least max_validators".into(),
            ));
        }
        if self.candidate_min_stake.is_zero() {
            return Err(CoreError::InvalidParams("candidate_min_stake must be positive".into()));
        }
        if self.delegators_ban_duration >= self.validator_ban_duration {
            return Err(CoreError::InvalidParams(
                "delegators_ban_duration must be shorter than validator_ban_duration".into(),
            ));
        }
        let curve = &self.reward_curve;
        if curve.floor_percent > curve.initial_percent || curve.initial_percent > 100 {
            return Err(CoreError::InvalidParams(format!(
                "reward curve requires floor {} <= initial {} <= 100",
                curve.floor_percent, curve.initial_percent
            )));
        }
        if self.token_inflation_bps > 0 && self.blocks_per_year == 0 {
            return Err(CoreError::InvalidParams(
                "blocks_per_year must be positive when inflation is enabled".into(),
            ));
        }
        Ok(())
    }
}

// tokenomics/src/shares.rs

//! Validator/delegator split of a pool's epoch reward.
//!
//! All math is unsigned big-integer, multiplications before divisions. The
//! truncation remainder always goes to the validator, so the shares add up
//! to the pool reward exactly.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use staking_core::{Amount, EpochNumber, ValidatorRewardCurve};
use staking_crypto::Address;

/// Validator's minimum percent of its pool reward in `epoch`.
///
/// Starts at `initial_percent` in epoch 0 and decays linearly (integer
/// division) to `floor_percent` at `decay_epochs`.
pub fn validator_min_percent(curve: &ValidatorRewardCurve, epoch: EpochNumber) -> u64 {
    if curve.decay_epochs == 0 || epoch >= curve.decay_epochs {
        return curve.floor_percent;
    }
    let span = curve.initial_percent.saturating_sub(curve.floor_percent);
    curve.floor_percent + span * (curve.decay_epochs - epoch) / curve.decay_epochs
}

/// Shares of one pool reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRewardSplit {
    pub validator: Amount,
    pub delegators: Vec<(Address, Amount)>,
}

impl PoolRewardSplit {
    pub fn total(&self) -> Amount {
        let delegated: Amount = self.delegators.iter().map(|(_, amount)| amount).sum();
        &self.validator + &delegated
    }
}

/// Split `reward` between a validator holding `validator_stake` and its
/// delegators.
///
/// With `p` the minimum percent, `V` the validator stake, `D` the delegated
/// total and `T = V + D`: when `V * (100 - p) > D * p` everyone is paid pro
/// rata (`R * D_i / T`); otherwise the validator is guaranteed `p` percent and
/// delegators share the rest (`R * D_i * (100 - p) / (D * 100)`).
pub fn split_pool_reward(
    reward: &Amount,
    validator_stake: &Amount,
    delegators: &[(Address, Amount)],
    min_percent: u64,
) -> PoolRewardSplit {
    let p = min_percent.min(100);
    let delegated: Amount = delegators.iter().map(|(_, amount)| amount).sum();
    let total = validator_stake + &delegated;

    if reward.is_zero() || delegated.is_zero() || total.is_zero() {
        return PoolRewardSplit {
            validator: reward.clone(),
            delegators: Vec::new(),
        };
    }

    let v = validator_stake.inner();
    let d = delegated.inner();
    let proportional = v * (100 - p) > d * p;

    let mut shares: Vec<(Address, Amount)> = Vec::with_capacity(delegators.len());
    for (delegator, stake) in delegators {
        if stake.is_zero() {
            continue;
        }
        let share = if proportional {
            Amount::new(reward.inner() * stake.inner() / total.inner())
        } else {
            Amount::new(reward.inner() * stake.inner() * BigUint::from(100 - p) / (d * BigUint::from(100u64)))
        };
        shares.push((*delegator, share));
    }

    let delegated_reward: Amount = shares.iter().map(|(_, amount)| amount).sum();
    PoolRewardSplit {
        validator: reward.saturating_sub(&delegated_reward),
        delegators: shares,
    }
}

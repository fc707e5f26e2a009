// consensus/src/selection.rs

use crate::{ConsensusError, ConsensusResult};
use num_bigint::BigUint;
use num_traits::Zero;
use stake_ledger::Likelihood;
use staking_crypto::{draw_value, Address, Hash};

/// Stake-weighted validator sampling without replacement.
///
/// A pure function of its inputs: the same likelihoods, unremovable pool and
/// seed always produce the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorSelector {
    max_validators: usize,
}

impl ValidatorSelector {
    pub fn new(max_validators: usize) -> Self {
        Self { max_validators }
    }

    pub fn max_validators(&self) -> usize {
        self.max_validators
    }

    /// Pick up to `max_validators` pools (staking addresses).
    ///
    /// The unremovable pool takes the first slot. When the remaining eligible
    /// pools fit in the remaining slots they are all taken; without a seed the
    /// first pools in registration order are taken instead of drawing.
    pub fn select(
        &self,
        likelihood: &Likelihood,
        unremovable: Option<Address>,
        seed: Option<Hash>,
    ) -> ConsensusResult<Vec<Address>> {
        let mut selected: Vec<Address> = Vec::with_capacity(self.max_validators);
        if let Some(pool) = unremovable {
            selected.push(pool);
        }

        let mut pools: Vec<Address> = Vec::with_capacity(likelihood.len());
        let mut weights: Vec<BigUint> = Vec::with_capacity(likelihood.len());
        for (pool, weight) in likelihood.pools.iter().zip(likelihood.weights.iter()) {
            if Some(*pool) == unremovable {
                continue;
            }
            pools.push(*pool);
            weights.push(weight.inner().clone());
        }

        let slots = self.max_validators.saturating_sub(selected.len());
        if pools.len() <= slots {
            selected.extend(pools);
            return Ok(selected);
        }

        let seed = match seed {
            Some(seed) => seed,
            None => {
                tracing::warn!(eligible = pools.len(), slots, "beacon not ready, selecting in registration order");
                selected.extend(pools.into_iter().take(slots));
                return Ok(selected);
            }
        };

        let mut sum: BigUint = weights.iter().sum();
        let mut size = pools.len();
        for iteration in 0..slots {
            if size == 0 || sum.is_zero() {
                break;
            }
            let random = BigUint::from_bytes_be(draw_value(&seed, iteration as u64).as_bytes()) % &sum;

            let mut accumulated = BigUint::zero();
            let mut chosen = size - 1;
            for (index, weight) in weights.iter().take(size).enumerate() {
                accumulated += weight;
                if accumulated > random {
                    chosen = index;
                    break;
                }
            }

            let pool = pools[chosen];
            if selected.contains(&pool) {
                return Err(ConsensusError::DuplicateDraw(pool));
            }
            selected.push(pool);

            sum -= &weights[chosen];
            size -= 1;
            pools.swap(chosen, size);
            weights.swap(chosen, size);
        }

        tracing::debug!(selected = selected.len(), "validators drawn");
        Ok(selected)
    }
}

// consensus/src/beacon.rs

use crate::validator_set::ValidatorMembership;
use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use staking_core::{BlockNumber, CallContext, EpochNumber, RoundNumber, SystemCall};
use staking_crypto::{commitment_digest, Address, Hash};
use std::collections::BTreeMap;

/// Phase of a collection round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconPhase {
    Commit,
    Reveal,
}

/// A validator's commitment for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub hash: Hash,
    pub cipher: Vec<u8>,
    pub revealed: Option<Hash>,
}

/// Commit-reveal randomness beacon.
///
/// Revealed numbers are XOR-combined into the seed, so the seed does not
/// depend on the order in which validators reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomBeacon {
    collect_round_length: u64,
    current_seed: Hash,
    seeded: bool,
    commits: BTreeMap<RoundNumber, BTreeMap<Address, Commitment>>,
    reveal_skips: BTreeMap<EpochNumber, BTreeMap<Address, u64>>,
}

impl RandomBeacon {
    pub fn new(collect_round_length: u64) -> Self {
        Self {
            collect_round_length: collect_round_length.max(2),
            current_seed: Hash::zero(),
            seeded: false,
            commits: BTreeMap::new(),
            reveal_skips: BTreeMap::new(),
        }
    }

    pub fn collect_round_length(&self) -> u64 {
        self.collect_round_length
    }

    /// Round containing `block`; block 1 opens round 0
    pub fn round_of(&self, block: BlockNumber) -> RoundNumber {
        block.saturating_sub(1) / self.collect_round_length
    }

    pub fn phase_of(&self, block: BlockNumber) -> BeaconPhase {
        let position = block.saturating_sub(1) % self.collect_round_length;
        if position < self.collect_round_length / 2 {
            BeaconPhase::Commit
        } else {
            BeaconPhase::Reveal
        }
    }

    pub fn is_commit_phase(&self, block: BlockNumber) -> bool {
        self.phase_of(block) == BeaconPhase::Commit
    }

    pub fn is_reveal_phase(&self, block: BlockNumber) -> bool {
        self.phase_of(block) == BeaconPhase::Reveal
    }

    /// Last block of the round containing `block`
    pub fn is_round_end(&self, block: BlockNumber) -> bool {
        block > 0 && block % self.collect_round_length == 0
    }

    /// Publish `hash = keccak256(number)` plus an opaque cipher of the number
    pub fn commit_hash(
        &mut self,
        ctx: &CallContext,
        validators: &impl ValidatorMembership,
        hash: Hash,
        cipher: Vec<u8>,
    ) -> ConsensusResult<()> {
        let validator = ctx.caller;
        if !validators.is_current_validator(&validator) {
            return Err(ConsensusError::NotValidator(validator));
        }
        if !self.is_commit_phase(ctx.block) {
            return Err(ConsensusError::NotCommitPhase(ctx.block));
        }
        if hash.is_zero() {
            return Err(ConsensusError::ZeroCommitment);
        }
        let round = self.round_of(ctx.block);
        let round_commits = self.commits.entry(round).or_default();
        if round_commits.contains_key(&validator) {
            return Err(ConsensusError::AlreadyCommitted { validator, round });
        }
        round_commits.insert(
            validator,
            Commitment {
                hash,
                cipher,
                revealed: None,
            },
        );
        tracing::debug!(validator = %validator, round, "beacon commit");
        Ok(())
    }

    /// Reveal the number behind this round's commitment and fold it into the seed
    pub fn reveal_number(
        &mut self,
        ctx: &CallContext,
        validators: &impl ValidatorMembership,
        number: Hash,
    ) -> ConsensusResult<()> {
        let validator = ctx.caller;
        if !validators.is_current_validator(&validator) {
            return Err(ConsensusError::NotValidator(validator));
        }
        if !self.is_reveal_phase(ctx.block) {
            return Err(ConsensusError::NotRevealPhase(ctx.block));
        }
        let round = self.round_of(ctx.block);
        let commitment = self
            .commits
            .get_mut(&round)
            .and_then(|round_commits| round_commits.get_mut(&validator))
            .ok_or(ConsensusError::NoCommitment { validator, round })?;
        if commitment.revealed.is_some() {
            return Err(ConsensusError::AlreadyRevealed { validator, round });
        }
        if commitment_digest(&number) != commitment.hash {
            return Err(ConsensusError::CommitmentMismatch(validator));
        }

        commitment.revealed = Some(number);
        self.current_seed = self.current_seed ^ number;
        self.seeded = true;
        tracing::debug!(validator = %validator, round, "beacon reveal");
        Ok(())
    }

    /// Per-block round bookkeeping.
    ///
    /// At a round's last block, counts a reveal skip against every current
    /// validator that did not reveal and discards the round's commitments.
    /// Returns the validators that skipped.
    pub fn on_finish_collect_round(
        &mut self,
        cap: &SystemCall,
        validators: &[Address],
        staking_epoch: EpochNumber,
    ) -> Vec<Address> {
        let block = cap.block();
        if !self.is_round_end(block) {
            return Vec::new();
        }
        let round = self.round_of(block);
        let round_commits = self.commits.remove(&round).unwrap_or_default();
        self.commits.retain(|r, _| *r > round);

        let skipped: Vec<Address> = validators
            .iter()
            .filter(|v| {
                round_commits
                    .get(*v)
                    .map(|c| c.revealed.is_none())
                    .unwrap_or(true)
            })
            .copied()
            .collect();

        if !skipped.is_empty() {
            let skips = self.reveal_skips.entry(staking_epoch).or_default();
            for validator in &skipped {
                *skips.entry(*validator).or_insert(0) += 1;
                tracing::warn!(validator = %validator, round, epoch = staking_epoch, "reveal skipped");
            }
        }
        skipped
    }

    /// Seed for selection; `None` while the beacon is not ready
    pub fn seed(&self) -> Option<Hash> {
        if !self.seeded || self.current_seed.is_zero() {
            return None;
        }
        Some(self.current_seed)
    }

    pub fn current_seed(&self) -> Hash {
        self.current_seed
    }

    pub fn reveal_skips(&self, staking_epoch: EpochNumber, validator: &Address) -> u64 {
        self.reveal_skips
            .get(&staking_epoch)
            .and_then(|skips| skips.get(validator))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_committed(&self, round: RoundNumber, validator: &Address) -> bool {
        self.commitment(round, validator).is_some()
    }

    pub fn sent_reveal(&self, round: RoundNumber, validator: &Address) -> bool {
        self.commitment(round, validator)
            .map(|c| c.revealed.is_some())
            .unwrap_or(false)
    }

    pub fn get_commit(&self, round: RoundNumber, validator: &Address) -> Option<Hash> {
        self.commitment(round, validator).map(|c| c.hash)
    }

    pub fn get_cipher(&self, round: RoundNumber, validator: &Address) -> Option<&[u8]> {
        self.commitment(round, validator).map(|c| c.cipher.as_slice())
    }

    fn commitment(&self, round: RoundNumber, validator: &Address) -> Option<&Commitment> {
        self.commits
            .get(&round)
            .and_then(|round_commits| round_commits.get(validator))
    }
}

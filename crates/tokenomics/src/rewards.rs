// tokenomics/src/rewards.rs

use crate::shares::{split_pool_reward, validator_min_percent};
use crate::{TokenomicsError, TokenomicsResult};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use stake_ledger::StakeReader;
use staking_core::{
    Amount, BlockNumber, BridgeCall, CallContext, EpochNumber, StakingEpoch, StakingParams,
    SystemCall, TokenLedger, ValidatorRewardCurve, REWARD_ACCOUNT,
};
use staking_crypto::Address;
use std::collections::{BTreeMap, BTreeSet};

/// Stake of one pool frozen at an epoch boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub mining_address: Address,
    pub validator_stake: Amount,
    pub total_stake: Amount,
}

/// Stake of every pool in an epoch's validator set, keyed by staking address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSnapshot {
    pub pools: BTreeMap<Address, PoolSnapshot>,
}

impl RewardSnapshot {
    pub fn total_stake(&self) -> Amount {
        self.pools.values().map(|p| &p.total_stake).sum()
    }
}

/// Fee accruals and carried-over reward
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccumulator {
    pub bridge_token_fee_accrued: Amount,
    pub bridge_native_fee_accrued: Amount,
    pub token_reward_undistributed: Amount,
    pub native_reward_undistributed: Amount,
}

/// A staker's share of one pool reward in one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerReward {
    pub token: Amount,
    pub native: Amount,
    pub claimed: bool,
}

/// What one `settle` call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub epoch: EpochNumber,
    pub token_distributable: Amount,
    pub native_distributable: Amount,
    pub token_distributed: Amount,
    pub native_distributed: Amount,
    pub inflation_minted: Amount,
    pub pools_rewarded: usize,
    pub validator_min_percent: u64,
}

/// Per-epoch productivity tally and reward settlement.
///
/// `settle` is the single mutation point of the carry-over accumulator and
/// runs once per epoch, in epoch order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDistributor {
    epoch_duration: u64,
    token_inflation_bps: u64,
    blocks_per_year: u64,
    reward_curve: ValidatorRewardCurve,
    accumulator: RewardAccumulator,
    blocks_created: BTreeMap<EpochNumber, BTreeMap<Address, u64>>,
    last_tallied_block: BlockNumber,
    snapshots: BTreeMap<EpochNumber, RewardSnapshot>,
    next_epoch_to_settle: EpochNumber,
    epoch_pool_token_reward: BTreeMap<(EpochNumber, Address), Amount>,
    epoch_pool_native_reward: BTreeMap<(EpochNumber, Address), Amount>,
    epochs_pool_got_reward_for: BTreeMap<Address, Vec<EpochNumber>>,
    staker_rewards: BTreeMap<(EpochNumber, Address, Address), StakerReward>,
    validator_min_percent: BTreeMap<EpochNumber, u64>,
}

impl RewardDistributor {
    pub fn new(params: &StakingParams) -> Self {
        Self {
            epoch_duration: params.epoch_duration,
            token_inflation_bps: params.token_inflation_bps,
            blocks_per_year: params.blocks_per_year,
            reward_curve: params.reward_curve,
            accumulator: RewardAccumulator::default(),
            blocks_created: BTreeMap::new(),
            last_tallied_block: 0,
            snapshots: BTreeMap::new(),
            next_epoch_to_settle: 0,
            epoch_pool_token_reward: BTreeMap::new(),
            epoch_pool_native_reward: BTreeMap::new(),
            epochs_pool_got_reward_for: BTreeMap::new(),
            staker_rewards: BTreeMap::new(),
            validator_min_percent: BTreeMap::new(),
        }
    }

    /// Count the block `cap.block()` for the pool whose validator produced it
    pub fn tally(
        &mut self,
        cap: &SystemCall,
        reader: &impl StakeReader,
        creator: &Address,
    ) -> TokenomicsResult<()> {
        let block = cap.block();
        if block <= self.last_tallied_block {
            return Err(TokenomicsError::NonMonotonicTally {
                block,
                last: self.last_tallied_block,
            });
        }
        let epoch = reader.staking_epoch();
        if block > epoch.end_block() {
            return Err(TokenomicsError::EpochEnded {
                block,
                epoch: epoch.number,
                end_block: epoch.end_block(),
            });
        }
        let pool = reader
            .staking_address_of(creator)
            .ok_or(TokenomicsError::UnknownValidator(*creator))?;

        *self
            .blocks_created
            .entry(epoch.number)
            .or_default()
            .entry(pool)
            .or_insert(0) += 1;
        self.last_tallied_block = block;
        Ok(())
    }

    pub fn add_bridge_token_fee(
        &mut self,
        _cap: &BridgeCall,
        token: &mut impl TokenLedger,
        amount: Amount,
    ) -> TokenomicsResult<()> {
        if amount.is_zero() {
            return Err(TokenomicsError::ZeroAmount);
        }
        token.mint(&REWARD_ACCOUNT, &amount)?;
        self.accumulator.bridge_token_fee_accrued =
            &self.accumulator.bridge_token_fee_accrued + &amount;
        tracing::debug!(amount = %amount, "bridge token fee accrued");
        Ok(())
    }

    pub fn add_bridge_native_fee(
        &mut self,
        _cap: &BridgeCall,
        native: &mut impl TokenLedger,
        amount: Amount,
    ) -> TokenomicsResult<()> {
        if amount.is_zero() {
            return Err(TokenomicsError::ZeroAmount);
        }
        native.mint(&REWARD_ACCOUNT, &amount)?;
        self.accumulator.bridge_native_fee_accrued =
            &self.accumulator.bridge_native_fee_accrued + &amount;
        tracing::debug!(amount = %amount, "bridge native fee accrued");
        Ok(())
    }

    /// Freeze `(validator stake, total stake)` of `pools` for `epoch`
    pub fn take_snapshot(
        &mut self,
        _cap: &SystemCall,
        reader: &impl StakeReader,
        epoch: EpochNumber,
        pools: &[Address],
    ) -> TokenomicsResult<()> {
        self.snapshot(reader, epoch, pools)
    }

    /// Distribute the rewards of `epoch` and snapshot `next_pools` for the
    /// epoch after it.
    ///
    /// Each pool's share of the distributable amounts is proportional to the
    /// blocks it created; whatever is not paid out carries over. Pools banned
    /// at the settling block forfeit their share.
    ///
    /// A call from a block past the epoch's end settles even when the last
    /// block was never tallied.
    pub fn settle(
        &mut self,
        cap: &SystemCall,
        token: &mut impl TokenLedger,
        reader: &impl StakeReader,
        epoch: &StakingEpoch,
        next_pools: &[Address],
    ) -> TokenomicsResult<SettlementReport> {
        let number = epoch.number;
        if number < self.next_epoch_to_settle {
            return Err(TokenomicsError::EpochAlreadySettled(number));
        }
        if number > self.next_epoch_to_settle {
            return Err(TokenomicsError::EpochOutOfOrder {
                expected: self.next_epoch_to_settle,
                got: number,
            });
        }
        if self.last_tallied_block < epoch.end_block() && cap.block() <= epoch.end_block() {
            return Err(TokenomicsError::EpochNotTallied {
                epoch: number,
                end_block: epoch.end_block(),
                last_tallied: self.last_tallied_block,
            });
        }
        if self.snapshots.contains_key(&(number + 1)) {
            return Err(TokenomicsError::SnapshotAlreadyTaken(number + 1));
        }
        let snapshot = self
            .snapshots
            .get(&number)
            .cloned()
            .ok_or(TokenomicsError::MissingSnapshot(number))?;

        let inflation = self.epoch_inflation(&snapshot);
        if !inflation.is_zero() {
            token.mint(&REWARD_ACCOUNT, &inflation)?;
        }

        let token_pool = &(&self.accumulator.token_reward_undistributed
            + &self.accumulator.bridge_token_fee_accrued)
            + &inflation;
        let native_pool = &self.accumulator.native_reward_undistributed
            + &self.accumulator.bridge_native_fee_accrued;

        let blocks = self.blocks_created.get(&number).cloned().unwrap_or_default();
        let total_blocks: u64 = snapshot
            .pools
            .keys()
            .map(|pool| blocks.get(pool).copied().unwrap_or(0))
            .sum();
        let min_percent = validator_min_percent(&self.reward_curve, number);

        let mut token_distributed = Amount::zero();
        let mut native_distributed = Amount::zero();
        let mut pools_rewarded = 0;

        if total_blocks > 0 {
            let total_blocks = BigUint::from(total_blocks);
            for (pool, pool_snapshot) in &snapshot.pools {
                let created = blocks.get(pool).copied().unwrap_or(0);
                if created == 0 {
                    continue;
                }
                if reader.is_banned(pool, cap.block()) {
                    tracing::warn!(epoch = number, pool = %pool, blocks = created, "banned pool forfeits its reward");
                    continue;
                }
                let created = BigUint::from(created);
                let pool_token = token_pool
                    .mul_div(&created, &total_blocks)
                    .unwrap_or_else(Amount::zero);
                let pool_native = native_pool
                    .mul_div(&created, &total_blocks)
                    .unwrap_or_else(Amount::zero);

                let delegators = reader.delegator_stakes_at(pool, number);
                let token_split =
                    split_pool_reward(&pool_token, &pool_snapshot.validator_stake, &delegators, min_percent);
                let native_split =
                    split_pool_reward(&pool_native, &pool_snapshot.validator_stake, &delegators, min_percent);

                let zero = Amount::zero();
                self.credit(number, *pool, *pool, &token_split.validator, &native_split.validator);
                for (delegator, share) in &token_split.delegators {
                    self.credit(number, *pool, *delegator, share, &zero);
                }
                for (delegator, share) in &native_split.delegators {
                    self.credit(number, *pool, *delegator, &zero, share);
                }

                token_distributed = &token_distributed + &pool_token;
                native_distributed = &native_distributed + &pool_native;
                self.epoch_pool_token_reward.insert((number, *pool), pool_token);
                self.epoch_pool_native_reward.insert((number, *pool), pool_native);
                self.epochs_pool_got_reward_for
                    .entry(*pool)
                    .or_default()
                    .push(number);
                pools_rewarded += 1;
            }
        } else {
            tracing::warn!(epoch = number, "no blocks tallied for the epoch's validators, carrying rewards over");
        }

        self.accumulator.bridge_token_fee_accrued = Amount::zero();
        self.accumulator.bridge_native_fee_accrued = Amount::zero();
        self.accumulator.token_reward_undistributed = token_pool.saturating_sub(&token_distributed);
        self.accumulator.native_reward_undistributed = native_pool.saturating_sub(&native_distributed);
        self.validator_min_percent.insert(number, min_percent);

        self.snapshot(reader, number + 1, next_pools)?;
        self.next_epoch_to_settle = number + 1;

        tracing::info!(
            epoch = number,
            token = %token_distributed,
            native = %native_distributed,
            pools = pools_rewarded,
            min_percent,
            "epoch rewards settled"
        );
        Ok(SettlementReport {
            epoch: number,
            token_distributable: token_pool,
            native_distributable: native_pool,
            token_distributed,
            native_distributed,
            inflation_minted: inflation,
            pools_rewarded,
            validator_min_percent: min_percent,
        })
    }

    /// Pay the caller's unclaimed shares of `pool`'s rewards for `epochs`
    pub fn claim_reward(
        &mut self,
        ctx: &CallContext,
        token: &mut impl TokenLedger,
        native: &mut impl TokenLedger,
        epochs: &[EpochNumber],
        pool: &Address,
    ) -> TokenomicsResult<(Amount, Amount)> {
        let staker = ctx.caller;
        let epochs: BTreeSet<EpochNumber> = epochs.iter().copied().collect();

        let mut token_total = Amount::zero();
        let mut native_total = Amount::zero();
        let mut keys = Vec::new();
        for epoch in epochs {
            let key = (epoch, *pool, staker);
            let Some(reward) = self.staker_rewards.get(&key) else {
                continue;
            };
            if reward.claimed {
                return Err(TokenomicsError::AlreadyClaimed { epoch, pool: *pool });
            }
            token_total = &token_total + &reward.token;
            native_total = &native_total + &reward.native;
            keys.push(key);
        }
        if keys.is_empty() {
            return Err(TokenomicsError::NothingToClaim);
        }

        if !token_total.is_zero() {
            token.transfer(&REWARD_ACCOUNT, &staker, &token_total)?;
        }
        if !native_total.is_zero() {
            native.transfer(&REWARD_ACCOUNT, &staker, &native_total)?;
        }
        for key in keys {
            if let Some(reward) = self.staker_rewards.get_mut(&key) {
                reward.claimed = true;
            }
        }

        tracing::debug!(staker = %staker, pool = %pool, token = %token_total, native = %native_total, "reward claimed");
        Ok((token_total, native_total))
    }

    pub fn accumulator(&self) -> &RewardAccumulator {
        &self.accumulator
    }

    pub fn blocks_created(&self, epoch: EpochNumber, pool: &Address) -> u64 {
        self.blocks_created
            .get(&epoch)
            .and_then(|blocks| blocks.get(pool))
            .copied()
            .unwrap_or(0)
    }

    pub fn last_tallied_block(&self) -> BlockNumber {
        self.last_tallied_block
    }

    pub fn next_epoch_to_settle(&self) -> EpochNumber {
        self.next_epoch_to_settle
    }

    pub fn snapshot_for(&self, epoch: EpochNumber) -> Option<&RewardSnapshot> {
        self.snapshots.get(&epoch)
    }

    pub fn epoch_pool_token_reward(&self, epoch: EpochNumber, pool: &Address) -> Amount {
        self.epoch_pool_token_reward
            .get(&(epoch, *pool))
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    pub fn epoch_pool_native_reward(&self, epoch: EpochNumber, pool: &Address) -> Amount {
        self.epoch_pool_native_reward
            .get(&(epoch, *pool))
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    pub fn epochs_pool_got_reward_for(&self, pool: &Address) -> &[EpochNumber] {
        self.epochs_pool_got_reward_for
            .get(pool)
            .map(|epochs| epochs.as_slice())
            .unwrap_or(&[])
    }

    pub fn staker_reward(&self, epoch: EpochNumber, pool: &Address, staker: &Address) -> Option<&StakerReward> {
        self.staker_rewards.get(&(epoch, *pool, *staker))
    }

    pub fn validator_min_percent(&self, epoch: EpochNumber) -> Option<u64> {
        self.validator_min_percent.get(&epoch).copied()
    }

    /// `Σ total_stake * bps * epoch_duration / (10000 * blocks_per_year)`
    fn epoch_inflation(&self, snapshot: &RewardSnapshot) -> Amount {
        if self.token_inflation_bps == 0 || self.blocks_per_year == 0 {
            return Amount::zero();
        }
        let numerator = BigUint::from(self.token_inflation_bps) * BigUint::from(self.epoch_duration);
        let denominator = BigUint::from(10_000u64) * BigUint::from(self.blocks_per_year);
        snapshot
            .total_stake()
            .mul_div(&numerator, &denominator)
            .unwrap_or_else(Amount::zero)
    }

    fn snapshot(
        &mut self,
        reader: &impl StakeReader,
        epoch: EpochNumber,
        pools: &[Address],
    ) -> TokenomicsResult<()> {
        if self.snapshots.contains_key(&epoch) {
            return Err(TokenomicsError::SnapshotAlreadyTaken(epoch));
        }
        let mut snapshot = RewardSnapshot::default();
        for pool in pools {
            let (validator_stake, total_stake) = reader
                .pool_stake(pool)
                .ok_or(TokenomicsError::UnknownPool(*pool))?;
            let mining_address = reader
                .mining_address_of(pool)
                .ok_or(TokenomicsError::UnknownPool(*pool))?;
            snapshot.pools.insert(
                *pool,
                PoolSnapshot {
                    mining_address,
                    validator_stake,
                    total_stake,
                },
            );
        }
        tracing::debug!(epoch, pools = snapshot.pools.len(), "reward snapshot taken");
        self.snapshots.insert(epoch, snapshot);
        Ok(())
    }

    fn credit(&mut self, epoch: EpochNumber, pool: Address, staker: Address, token: &Amount, native: &Amount) {
        if token.is_zero() && native.is_zero() {
            return;
        }
        let entry = self
            .staker_rewards
            .entry((epoch, pool, staker))
            .or_insert(StakerReward {
                token: Amount::zero(),
                native: Amount::zero(),
                claimed: false,
            });
        entry.token = &entry.token + token;
        entry.native = &entry.native + native;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staking_core::{BalanceLedger, SystemAuthority};

    /// Fixed-stake reader standing in for the ledger; epochs are 10 blocks
    #[derive(Default)]
    struct Stakes {
        epoch: EpochNumber,
        pools: BTreeMap<Address, (Address, Amount, Vec<(Address, Amount)>)>,
        banned: BTreeSet<Address>,
    }

    impl Stakes {
        fn with_pool(mut self, name: &str, own: u64, delegators: &[(&str, u64)]) -> Self {
            let delegators = delegators
                .iter()
                .map(|(n, s)| (addr(n), Amount::from_u64(*s)))
                .collect();
            self.pools
                .insert(addr(name), (mining(name), Amount::from_u64(own), delegators));
            self
        }

        fn with_banned(mut self, name: &str) -> Self {
            self.banned.insert(addr(name));
            self
        }
    }

    impl StakeReader for Stakes {
        fn staking_epoch(&self) -> StakingEpoch {
            StakingEpoch {
                number: self.epoch,
                start_block: self.epoch * 10 + 1,
                duration_blocks: 10,
            }
        }

        fn staking_address_of(&self, m: &Address) -> Option<Address> {
            self.pools
                .iter()
                .find(|(_, (mining, _, _))| mining == m)
                .map(|(staking, _)| *staking)
        }

        fn mining_address_of(&self, staking: &Address) -> Option<Address> {
            self.pools.get(staking).map(|(mining, _, _)| *mining)
        }

        fn pool_stake(&self, staking: &Address) -> Option<(Amount, Amount)> {
            self.pools.get(staking).map(|(_, own, delegators)| {
                let delegated: Amount = delegators.iter().map(|(_, s)| s).sum();
                (own.clone(), own + &delegated)
            })
        }

        fn delegator_stakes_at(&self, staking: &Address, _epoch: EpochNumber) -> Vec<(Address, Amount)> {
            self.pools
                .get(staking)
                .map(|(_, _, delegators)| delegators.clone())
                .unwrap_or_default()
        }

        fn is_banned(&self, staking: &Address, _block: BlockNumber) -> bool {
            self.banned.contains(staking)
        }
    }

    fn addr(name: &str) -> Address {
        Address::derive(name.as_bytes())
    }

    fn mining(name: &str) -> Address {
        Address::derive(format!("{}-mining", name).as_bytes())
    }

    fn params() -> StakingParams {
        StakingParams {
            epoch_duration: 10,
            stake_withdraw_disallow_period: 2,
            collect_round_length: 2,
            ..Default::default()
        }
    }

    fn authority() -> SystemAuthority {
        SystemAuthority::new(addr("system"), addr("admin"))
            .unwrap()
            .with_bridge(addr("bridge"))
    }

    fn system_call(block: BlockNumber) -> SystemCall {
        authority()
            .authorize_system(&CallContext::new(addr("system"), block))
            .unwrap()
    }

    fn bridge_call() -> BridgeCall {
        authority()
            .authorize_bridge(&CallContext::new(addr("bridge"), 1))
            .unwrap()
    }

    fn tally_blocks(rewards: &mut RewardDistributor, stakes: &Stakes, from: BlockNumber, creators: &[&str]) {
        for (i, creator) in creators.iter().enumerate() {
            rewards
                .tally(&system_call(from + i as u64), stakes, &mining(creator))
                .unwrap();
        }
    }

    #[test]
    fn test_tally_must_advance() {
        let stakes = Stakes::default().with_pool("a", 100, &[]);
        let mut rewards = RewardDistributor::new(&params());
        rewards.tally(&system_call(1), &stakes, &mining("a")).unwrap();
        assert!(matches!(
            rewards.tally(&system_call(1), &stakes, &mining("a")),
            Err(TokenomicsError::NonMonotonicTally { block: 1, last: 1 })
        ));
        assert!(matches!(
            rewards.tally(&system_call(2), &stakes, &mining("zz")),
            Err(TokenomicsError::UnknownValidator(_))
        ));
        assert_eq!(rewards.blocks_created(0, &addr("a")), 1);
    }

    #[test]
    fn test_settle_splits_by_blocks_and_stake() {
        let stakes = Stakes::default()
            .with_pool("a", 100, &[("dave", 900)])
            .with_pool("b", 100, &[]);
        let mut rewards = RewardDistributor::new(&params());
        let mut token = BalanceLedger::new();
        let pools = [addr("a"), addr("b")];
        rewards.take_snapshot(&system_call(0), &stakes, 0, &pools).unwrap();
        rewards
            .add_bridge_token_fee(&bridge_call(), &mut token, Amount::from_u64(1_000))
            .unwrap();

        tally_blocks(&mut rewards, &stakes, 1, &["a", "a", "a", "a", "a", "b", "b", "b", "b", "b"]);
        let epoch = StakingEpoch::genesis(10);
        let report = rewards
            .settle(&system_call(10), &mut token, &stakes, &epoch, &pools)
            .unwrap();

        assert_eq!(report.token_distributed, Amount::from_u64(1_000));
        assert_eq!(rewards.epoch_pool_token_reward(0, &addr("a")), Amount::from_u64(500));
        // the validator holds 10% of the pool and is guaranteed 30%
        let validator = rewards.staker_reward(0, &addr("a"), &addr("a")).unwrap();
        let dave = rewards.staker_reward(0, &addr("a"), &addr("dave")).unwrap();
        assert_eq!(validator.token, Amount::from_u64(150));
        assert_eq!(dave.token, Amount::from_u64(350));
        assert_eq!(rewards.validator_min_percent(0), Some(30));
        assert_eq!(
            rewards.staker_reward(0, &addr("b"), &addr("b")).unwrap().token,
            Amount::from_u64(500)
        );
        assert_eq!(rewards.epochs_pool_got_reward_for(&addr("a")), &[0]);
        assert!(rewards.accumulator().token_reward_undistributed.is_zero());
        assert!(rewards.accumulator().bridge_token_fee_accrued.is_zero());
        assert!(rewards.snapshot_for(1).is_some());
    }

    #[test]
    fn test_settle_guards() {
        let stakes = Stakes::default().with_pool("a", 100, &[]);
        let mut rewards = RewardDistributor::new(&params());
        let mut token = BalanceLedger::new();
        let pools = [addr("a")];
        let epoch = StakingEpoch::genesis(10);

        tally_blocks(&mut rewards, &stakes, 1, &["a"; 9]);
        assert!(matches!(
            rewards.settle(&system_call(9), &mut token, &stakes, &epoch, &pools),
            Err(TokenomicsError::EpochNotTallied { epoch: 0, end_block: 10, last_tallied: 9 })
        ));
        tally_blocks(&mut rewards, &stakes, 10, &["a"]);
        assert!(matches!(
            rewards.settle(&system_call(10), &mut token, &stakes, &epoch, &pools),
            Err(TokenomicsError::MissingSnapshot(0))
        ));

        rewards.take_snapshot(&system_call(0), &stakes, 0, &pools).unwrap();
        assert!(matches!(
            rewards.take_snapshot(&system_call(0), &stakes, 0, &pools),
            Err(TokenomicsError::SnapshotAlreadyTaken(0))
        ));
        assert!(matches!(
            rewards.settle(&system_call(10), &mut token, &stakes, &epoch.next(11), &pools),
            Err(TokenomicsError::EpochOutOfOrder { expected: 0, got: 1 })
        ));
        rewards
            .settle(&system_call(10), &mut token, &stakes, &epoch, &pools)
            .unwrap();
        assert!(matches!(
            rewards.settle(&system_call(10), &mut token, &stakes, &epoch, &pools),
            Err(TokenomicsError::EpochAlreadySettled(0))
        ));
    }

    #[test]
    fn test_tally_rejects_blocks_past_the_epoch() {
        let stakes = Stakes::default().with_pool("a", 100, &[]);
        let mut rewards = RewardDistributor::new(&params());
        tally_blocks(&mut rewards, &stakes, 1, &["a"; 10]);
        assert!(matches!(
            rewards.tally(&system_call(11), &stakes, &mining("a")),
            Err(TokenomicsError::EpochEnded { block: 11, epoch: 0, end_block: 10 })
        ));
        assert_eq!(rewards.last_tallied_block(), 10);
        assert_eq!(rewards.blocks_created(0, &addr("a")), 10);
    }

    #[test]
    fn test_settle_after_missed_last_block() {
        let stakes = Stakes::default().with_pool("a", 100, &[]);
        let mut rewards = RewardDistributor::new(&params());
        let mut token = BalanceLedger::new();
        rewards
            .take_snapshot(&system_call(0), &stakes, 0, &[addr("a")])
            .unwrap();
        rewards
            .add_bridge_token_fee(&bridge_call(), &mut token, Amount::from_u64(90))
            .unwrap();
        tally_blocks(&mut rewards, &stakes, 1, &["a"; 9]);

        let epoch = StakingEpoch::genesis(10);
        assert!(matches!(
            rewards.settle(&system_call(10), &mut token, &stakes, &epoch, &[addr("a")]),
            Err(TokenomicsError::EpochNotTallied { .. })
        ));
        let report = rewards
            .settle(&system_call(11), &mut token, &stakes, &epoch, &[addr("a")])
            .unwrap();
        assert_eq!(report.token_distributed, Amount::from_u64(90));
        assert_eq!(rewards.next_epoch_to_settle(), 1);
    }

    #[test]
    fn test_banned_pool_reward_carries_over() {
        let stakes = Stakes::default()
            .with_pool("a", 100, &[("dave", 100)])
            .with_pool("b", 100, &[])
            .with_banned("a");
        let mut rewards = RewardDistributor::new(&params());
        let mut token = BalanceLedger::new();
        let pools = [addr("a"), addr("b")];
        rewards.take_snapshot(&system_call(0), &stakes, 0, &pools).unwrap();
        rewards
            .add_bridge_token_fee(&bridge_call(), &mut token, Amount::from_u64(1_000))
            .unwrap();

        tally_blocks(&mut rewards, &stakes, 1, &["a", "a", "a", "a", "a", "b", "b", "b", "b", "b"]);
        let report = rewards
            .settle(&system_call(10), &mut token, &stakes, &StakingEpoch::genesis(10), &[addr("b")])
            .unwrap();

        assert_eq!(report.pools_rewarded, 1);
        assert_eq!(report.token_distributed, Amount::from_u64(500));
        assert!(rewards.epoch_pool_token_reward(0, &addr("a")).is_zero());
        assert!(rewards.staker_reward(0, &addr("a"), &addr("a")).is_none());
        assert!(rewards.staker_reward(0, &addr("a"), &addr("dave")).is_none());
        assert!(rewards.epochs_pool_got_reward_for(&addr("a")).is_empty());
        assert_eq!(rewards.epoch_pool_token_reward(0, &addr("b")), Amount::from_u64(500));
        assert_eq!(rewards.accumulator().token_reward_undistributed, Amount::from_u64(500));
    }

    #[test]
    fn test_zero_blocks_carry_over() {
        let stakes = Stakes::default().with_pool("a", 100, &[]).with_pool("b", 100, &[]);
        let mut rewards = RewardDistributor::new(&params());
        let mut token = BalanceLedger::new();
        let mut native = BalanceLedger::new();
        rewards
            .take_snapshot(&system_call(0), &stakes, 0, &[addr("a")])
            .unwrap();
        rewards
            .add_bridge_native_fee(&bridge_call(), &mut native, Amount::from_u64(30))
            .unwrap();

        // only a pool outside the snapshot produced blocks
        tally_blocks(&mut rewards, &stakes, 1, &["b"; 10]);
        let report = rewards
            .settle(&system_call(10), &mut token, &stakes, &StakingEpoch::genesis(10), &[addr("a")])
            .unwrap();
        assert_eq!(report.pools_rewarded, 0);
        assert!(report.native_distributed.is_zero());
        assert_eq!(rewards.accumulator().native_reward_undistributed, Amount::from_u64(30));
        assert!(rewards.epochs_pool_got_reward_for(&addr("a")).is_empty());
    }

    #[test]
    fn test_inflation_minted_at_settlement() {
        let params = StakingParams {
            token_inflation_bps: 1_000,
            blocks_per_year: 100,
            ..params()
        };
        let stakes = Stakes::default().with_pool("a", 1_000, &[]);
        let mut rewards = RewardDistributor::new(&params);
        let mut token = BalanceLedger::new();
        rewards
            .take_snapshot(&system_call(0), &stakes, 0, &[addr("a")])
            .unwrap();
        tally_blocks(&mut rewards, &stakes, 1, &["a"; 10]);

        let report = rewards
            .settle(&system_call(10), &mut token, &stakes, &StakingEpoch::genesis(10), &[addr("a")])
            .unwrap();
        // 1000 * 1000 * 10 / (10000 * 100) = 10
        assert_eq!(report.inflation_minted, Amount::from_u64(10));
        assert_eq!(token.balance_of(&REWARD_ACCOUNT), Amount::from_u64(10));
        assert_eq!(report.token_distributed, Amount::from_u64(10));
    }

    #[test]
    fn test_claim_once() {
        let stakes = Stakes::default().with_pool("a", 100, &[("dave", 100)]);
        let mut rewards = RewardDistributor::new(&params());
        let mut token = BalanceLedger::new();
        let mut native = BalanceLedger::new();
        rewards
            .take_snapshot(&system_call(0), &stakes, 0, &[addr("a")])
            .unwrap();
        rewards
            .add_bridge_token_fee(&bridge_call(), &mut token, Amount::from_u64(100))
            .unwrap();
        rewards
            .add_bridge_native_fee(&bridge_call(), &mut native, Amount::from_u64(10))
            .unwrap();
        tally_blocks(&mut rewards, &stakes, 1, &["a"; 10]);
        rewards
            .settle(&system_call(10), &mut token, &stakes, &StakingEpoch::genesis(10), &[addr("a")])
            .unwrap();

        let dave = CallContext::new(addr("dave"), 11);
        let (paid_token, paid_native) = rewards
            .claim_reward(&dave, &mut token, &mut native, &[0, 0], &addr("a"))
            .unwrap();
        assert_eq!(paid_token, Amount::from_u64(50));
        assert_eq!(paid_native, Amount::from_u64(5));
        assert_eq!(token.balance_of(&addr("dave")), Amount::from_u64(50));
        assert!(matches!(
            rewards.claim_reward(&dave, &mut token, &mut native, &[0], &addr("a")),
            Err(TokenomicsError::AlreadyClaimed { epoch: 0, .. })
        ));
        assert!(matches!(
            rewards.claim_reward(&dave, &mut token, &mut native, &[1], &addr("a")),
            Err(TokenomicsError::NothingToClaim)
        ));
    }
}

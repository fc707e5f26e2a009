// ledger/src/ledger.rs

use crate::pool::{DelegatorStake, Pool, PoolStatus, WithdrawalOrder};
use crate::{LedgerError, LedgerResult};
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};
use staking_core::{
    Amount, BlockNumber, CallContext, EpochNumber, StakingEpoch, StakingParams, SystemCall,
    TokenLedger, STAKING_ACCOUNT,
};
use staking_crypto::Address;
use std::collections::{BTreeMap, BTreeSet};

/// Stake weights of the electable pools, in registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Likelihood {
    /// Staking addresses
    pub pools: Vec<Address>,
    /// Total stake of each pool, parallel to `pools`
    pub weights: Vec<Amount>,
    pub sum: Amount,
}

impl Likelihood {
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Read-only view of pool stake used by selection and reward settlement
pub trait StakeReader {
    fn staking_epoch(&self) -> StakingEpoch;

    fn staking_address_of(&self, mining: &Address) -> Option<Address>;

    fn mining_address_of(&self, staking: &Address) -> Option<Address>;

    /// `(own_stake, total_stake)` of a pool
    fn pool_stake(&self, staking: &Address) -> Option<(Amount, Amount)>;

    /// Non-zero delegated amounts that counted in `epoch`
    fn delegator_stakes_at(&self, staking: &Address, epoch: EpochNumber) -> Vec<(Address, Amount)>;

    /// Whether the pool is excluded by a ban at `block`
    fn is_banned(&self, staking: &Address, block: BlockNumber) -> bool;
}

/// Pool, delegator and withdrawal-order bookkeeping.
///
/// Every mutating call validates completely before it moves tokens or
/// touches a record, so a rejected call leaves no trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeLedger {
    params: StakingParams,
    epoch: StakingEpoch,
    pools: BTreeMap<Address, Pool>,
    registration_order: Vec<Address>,
    staking_by_mining: BTreeMap<Address, Address>,
}

impl StakeLedger {
    pub fn new(params: StakingParams) -> LedgerResult<Self> {
        params.validate()?;
        let epoch = StakingEpoch::genesis(params.epoch_duration);
        Ok(Self {
            params,
            epoch,
            pools: BTreeMap::new(),
            registration_order: Vec::new(),
            staking_by_mining: BTreeMap::new(),
        })
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    pub fn epoch(&self) -> &StakingEpoch {
        &self.epoch
    }

    /// Register a pool for the caller with `own_stake` escrowed from its balance
    pub fn add_pool(
        &mut self,
        ctx: &CallContext,
        token: &mut impl TokenLedger,
        mining_address: Address,
        own_stake: Amount,
    ) -> LedgerResult<()> {
        let staking_address = ctx.caller;
        self.check_new_identity(&staking_address, &mining_address)?;
        if self.pools.len() >= self.params.max_candidates {
            return Err(LedgerError::TooManyPools {
                max: self.params.max_candidates,
            });
        }
        self.ensure_window(ctx.block)?;
        if own_stake < self.params.candidate_min_stake {
            return Err(LedgerError::InsufficientStake {
                required: self.params.candidate_min_stake.clone(),
                provided: own_stake,
            });
        }

        token.transfer(&staking_address, &STAKING_ACCOUNT, &own_stake)?;

        let mut pool = Pool::new(staking_address, mining_address, PoolStatus::Candidate, ctx.block);
        pool.own_stake = own_stake.clone();
        pool.total_stake = own_stake.clone();
        pool.own_staked_this_epoch.add(self.epoch.number, &own_stake);
        self.insert_pool(pool);

        tracing::info!(
            pool = %staking_address,
            mining = %mining_address,
            stake = %own_stake,
            "pool registered"
        );
        Ok(())
    }

    /// Register a genesis validator pool. The escrow is minted, not transferred.
    pub fn add_genesis_pool(
        &mut self,
        token: &mut impl TokenLedger,
        staking_address: Address,
        mining_address: Address,
        own_stake: Amount,
    ) -> LedgerResult<()> {
        if self.epoch.number != 0 {
            return Err(LedgerError::GenesisClosed);
        }
        self.check_new_identity(&staking_address, &mining_address)?;
        if self.pools.len() >= self.params.max_candidates {
            return Err(LedgerError::TooManyPools {
                max: self.params.max_candidates,
            });
        }
        if own_stake < self.params.candidate_min_stake {
            return Err(LedgerError::InsufficientStake {
                required: self.params.candidate_min_stake.clone(),
                provided: own_stake,
            });
        }

        token.mint(&STAKING_ACCOUNT, &own_stake)?;

        let mut pool = Pool::new(staking_address, mining_address, PoolStatus::Active, 0);
        pool.own_stake = own_stake.clone();
        pool.total_stake = own_stake;
        pool.in_current_set = true;
        self.insert_pool(pool);

        tracing::debug!(pool = %staking_address, mining = %mining_address, "genesis pool registered");
        Ok(())
    }

    /// Stake `amount` into `pool_id` on behalf of the caller.
    ///
    /// The owner staking into its own pool tops up its own stake (and may
    /// reactivate an exited pool); anyone else becomes or grows a delegator.
    pub fn stake(
        &mut self,
        ctx: &CallContext,
        token: &mut impl TokenLedger,
        pool_id: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        self.ensure_window(ctx.block)?;
        let staker = ctx.caller;
        let epoch = self.epoch.number;
        let is_owner = staker == *pool_id;

        let pool = self.pool_ref(pool_id)?;
        if pool.is_banned(ctx.block) {
            return Err(LedgerError::PoolBanned {
                pool: *pool_id,
                until: pool.banned_until,
            });
        }
        let new_amount = &pool.stake_of(&staker) + &amount;
        if is_owner {
            if new_amount < self.params.candidate_min_stake {
                return Err(LedgerError::InsufficientStake {
                    required: self.params.candidate_min_stake.clone(),
                    provided: new_amount,
                });
            }
        } else {
            if matches!(pool.status, PoolStatus::ToBeRemoved | PoolStatus::Inactive) {
                return Err(LedgerError::PoolInactive(*pool_id));
            }
            if new_amount < self.params.delegator_min_stake {
                return Err(LedgerError::InsufficientStake {
                    required: self.params.delegator_min_stake.clone(),
                    provided: new_amount,
                });
            }
            let is_new_position = pool.stake_of(&staker).is_zero();
            if is_new_position && active_delegators(pool) >= self.params.max_delegators_per_pool {
                return Err(LedgerError::TooManyDelegators {
                    pool: *pool_id,
                    max: self.params.max_delegators_per_pool,
                });
            }
        }

        token.transfer(&staker, &STAKING_ACCOUNT, &amount)?;

        let candidate_min = self.params.candidate_min_stake.clone();
        let pool = self.pool_mut(pool_id)?;
        if is_owner {
            pool.own_stake = new_amount;
            pool.own_staked_this_epoch.add(epoch, &amount);
            if matches!(pool.status, PoolStatus::ToBeRemoved | PoolStatus::Inactive) {
                pool.status = PoolStatus::Candidate;
                pool.refresh_status(&candidate_min);
                tracing::info!(pool = %pool_id, status = ?pool.status, "pool reactivated");
            }
        } else {
            let position = pool
                .delegators
                .entry(staker)
                .or_insert_with(|| DelegatorStake::new(epoch));
            position.set_amount(epoch, new_amount);
            position.staked_this_epoch_mut().add(epoch, &amount);
        }
        pool.total_stake = &pool.total_stake + &amount;

        tracing::debug!(pool = %pool_id, staker = %staker, amount = %amount, "stake added");
        Ok(())
    }

    /// Instant withdrawal.
    ///
    /// Unrestricted while the pool sits in neither the current nor the
    /// pending validator set; otherwise only stake placed during the current
    /// epoch can leave this way.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        token: &mut impl TokenLedger,
        pool_id: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        self.ensure_window(ctx.block)?;
        let staker = ctx.caller;
        let epoch = self.epoch.number;

        let pool = self.pool_ref(pool_id)?;
        check_withdraw_bans(pool, &staker, ctx.block)?;
        let available = self.max_withdraw_allowed(pool, &staker);
        if amount > available {
            return Err(LedgerError::WithdrawalExceedsAvailable {
                available,
                requested: amount,
            });
        }
        let remaining = pool.stake_of(&staker) - amount.clone();
        self.check_remaining(pool, &staker, &remaining)?;

        token.transfer(&STAKING_ACCOUNT, &staker, &amount)?;

        let pool = self.pool_mut(pool_id)?;
        decrease_stake(pool, &staker, &amount, epoch);
        mark_owner_exit(pool);

        tracing::debug!(pool = %pool_id, staker = %staker, amount = %amount, "stake withdrawn");
        Ok(())
    }

    /// Order (positive `delta`) or cancel (negative `delta`) a withdrawal from
    /// a pool in the current or pending validator set.
    ///
    /// Ordered stake leaves the pool's total at once and is claimable after
    /// the staking epoch advances past the order's epoch.
    pub fn order_withdrawal(
        &mut self,
        ctx: &CallContext,
        pool_id: &Address,
        delta: &BigInt,
    ) -> LedgerResult<()> {
        if delta.sign() == Sign::NoSign {
            return Err(LedgerError::ZeroAmount);
        }
        self.ensure_window(ctx.block)?;
        let staker = ctx.caller;
        let epoch = self.epoch.number;
        let is_owner = staker == *pool_id;
        let amount = Amount::new(delta.magnitude().clone());

        let pool = self.pool_ref(pool_id)?;
        check_withdraw_bans(pool, &staker, ctx.block)?;
        let current = pool.stake_of(&staker);

        if delta.sign() == Sign::Plus {
            if !pool.in_validator_set() {
                return Err(LedgerError::NotValidatorPool(*pool_id));
            }
            if amount > current {
                return Err(LedgerError::WithdrawalExceedsAvailable {
                    available: current,
                    requested: amount,
                });
            }
            let remaining = current - amount.clone();
            self.check_remaining(pool, &staker, &remaining)?;

            let pool = self.pool_mut(pool_id)?;
            decrease_stake(pool, &staker, &amount, epoch);
            let order = pool
                .withdrawal_orders
                .entry(staker)
                .or_insert_with(|| WithdrawalOrder {
                    amount: Amount::zero(),
                    epoch,
                });
            order.amount = &order.amount + &amount;
            order.epoch = epoch;
            mark_owner_exit(pool);

            tracing::debug!(pool = %pool_id, staker = %staker, amount = %amount, "withdrawal ordered");
            return Ok(());
        }

        let ordered = pool.ordered_amount(&staker);
        if ordered.is_zero() {
            return Err(LedgerError::NoWithdrawalOrder {
                pool: *pool_id,
                staker,
            });
        }
        if amount > ordered {
            return Err(LedgerError::WithdrawalExceedsOrdered {
                ordered,
                requested: amount,
            });
        }
        if pool.is_banned(ctx.block) {
            return Err(LedgerError::PoolBanned {
                pool: *pool_id,
                until: pool.banned_until,
            });
        }
        let restored = &current + &amount;
        let required = if is_owner {
            &self.params.candidate_min_stake
        } else {
            &self.params.delegator_min_stake
        };
        if restored < *required {
            return Err(LedgerError::InsufficientStake {
                required: required.clone(),
                provided: restored,
            });
        }

        let candidate_min = self.params.candidate_min_stake.clone();
        let pool = self.pool_mut(pool_id)?;
        if is_owner {
            pool.own_stake = restored;
            if pool.status == PoolStatus::ToBeRemoved {
                pool.status = PoolStatus::Candidate;
                pool.refresh_status(&candidate_min);
            }
        } else {
            pool.delegators
                .entry(staker)
                .or_insert_with(|| DelegatorStake::new(epoch))
                .set_amount(epoch, restored);
        }
        pool.total_stake = &pool.total_stake + &amount;
        let left = ordered - amount.clone();
        if left.is_zero() {
            pool.withdrawal_orders.remove(&staker);
        } else {
            pool.withdrawal_orders.insert(staker, WithdrawalOrder { amount: left, epoch });
        }

        tracing::debug!(pool = %pool_id, staker = %staker, amount = %amount, "withdrawal order reduced");
        Ok(())
    }

    /// Pay out the caller's whole withdrawal order once its epoch has passed
    pub fn claim_ordered_withdrawal(
        &mut self,
        ctx: &CallContext,
        token: &mut impl TokenLedger,
        pool_id: &Address,
    ) -> LedgerResult<Amount> {
        self.ensure_window(ctx.block)?;
        let staker = ctx.caller;

        let pool = self.pool_ref(pool_id)?;
        let order = pool
            .withdrawal_orders
            .get(&staker)
            .ok_or(LedgerError::NoWithdrawalOrder {
                pool: *pool_id,
                staker,
            })?;
        if order.epoch >= self.epoch.number {
            return Err(LedgerError::OrderNotClaimable {
                order_epoch: order.epoch,
                current_epoch: self.epoch.number,
            });
        }
        check_withdraw_bans(pool, &staker, ctx.block)?;
        let amount = order.amount.clone();

        token.transfer(&STAKING_ACCOUNT, &staker, &amount)?;
        self.pool_mut(pool_id)?.withdrawal_orders.remove(&staker);

        tracing::debug!(pool = %pool_id, staker = %staker, amount = %amount, "ordered withdrawal claimed");
        Ok(amount)
    }

    /// Owner-initiated exit of the caller's pool
    pub fn remove_my_pool(&mut self, ctx: &CallContext) -> LedgerResult<PoolStatus> {
        let pool = self.pool_mut(&ctx.caller)?;
        if pool.unremovable {
            return Err(LedgerError::UnremovablePool(ctx.caller));
        }
        deactivate(pool)
    }

    /// Evict a pool on behalf of the system
    pub fn remove_pool(&mut self, _cap: &SystemCall, pool_id: &Address) -> LedgerResult<PoolStatus> {
        deactivate(self.pool_mut(pool_id)?)
    }

    /// Ban a pool from election until `until`, and its delegators from
    /// withdrawing until `delegators_until`. Bans only ever extend.
    pub fn ban_pool(
        &mut self,
        pool_id: &Address,
        until: BlockNumber,
        delegators_until: BlockNumber,
    ) -> LedgerResult<()> {
        let pool = self.pool_mut(pool_id)?;
        pool.banned_until = pool.banned_until.max(until);
        pool.delegators_banned_until = pool.delegators_banned_until.max(delegators_until);
        pool.status = PoolStatus::Inactive;
        tracing::info!(
            pool = %pool_id,
            until = pool.banned_until,
            delegators_until = pool.delegators_banned_until,
            "pool banned"
        );
        Ok(())
    }

    pub fn set_unremovable(&mut self, pool_id: &Address, unremovable: bool) -> LedgerResult<()> {
        self.pool_mut(pool_id)?.unremovable = unremovable;
        Ok(())
    }

    /// Record validator-set membership and derive every pool's status from it
    pub fn sync_validator_sets(&mut self, current: &BTreeSet<Address>, pending: &BTreeSet<Address>) {
        let candidate_min = self.params.candidate_min_stake.clone();
        for (address, pool) in self.pools.iter_mut() {
            pool.in_current_set = current.contains(address);
            pool.in_pending_set = pending.contains(address);
            pool.refresh_status(&candidate_min);
        }
    }

    /// Pools eligible for the next election, in registration order
    pub fn pools_to_be_elected(&self, block: BlockNumber) -> Vec<Address> {
        self.electable(block).map(|pool| pool.staking_address).collect()
    }

    /// Parallel pool/weight arrays and their sum; weight is total stake
    pub fn likelihood(&self, block: BlockNumber) -> Likelihood {
        let mut likelihood = Likelihood {
            pools: Vec::new(),
            weights: Vec::new(),
            sum: Amount::zero(),
        };
        for pool in self.electable(block) {
            likelihood.sum = &likelihood.sum + &pool.total_stake;
            likelihood.pools.push(pool.staking_address);
            likelihood.weights.push(pool.total_stake.clone());
        }
        likelihood
    }

    /// Advance to the next staking epoch, which must start right after the current one
    pub fn increment_epoch(
        &mut self,
        _cap: &SystemCall,
        next_start_block: BlockNumber,
    ) -> LedgerResult<StakingEpoch> {
        let expected = self.epoch.end_block() + 1;
        if next_start_block != expected {
            return Err(LedgerError::InvalidEpochTransition {
                expected,
                got: next_start_block,
            });
        }
        self.epoch = self.epoch.next(next_start_block);
        tracing::info!(
            epoch = self.epoch.number,
            start = self.epoch.start_block,
            end = self.epoch.end_block(),
            "staking epoch started"
        );
        Ok(self.epoch)
    }

    pub fn pool(&self, staking: &Address) -> Option<&Pool> {
        self.pools.get(staking)
    }

    pub fn pool_by_mining(&self, mining: &Address) -> Option<&Pool> {
        self.staking_by_mining
            .get(mining)
            .and_then(|staking| self.pools.get(staking))
    }

    /// All pools, in registration order
    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.registration_order
            .iter()
            .filter_map(move |address| self.pools.get(address))
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn stake_amount(&self, pool_id: &Address, staker: &Address) -> Amount {
        self.pools
            .get(pool_id)
            .map(|pool| pool.stake_of(staker))
            .unwrap_or_else(Amount::zero)
    }

    pub fn withdrawal_order(&self, pool_id: &Address, staker: &Address) -> Option<&WithdrawalOrder> {
        self.pools
            .get(pool_id)
            .and_then(|pool| pool.withdrawal_orders.get(staker))
    }

    pub fn delegator_stake_at(&self, pool_id: &Address, delegator: &Address, epoch: EpochNumber) -> Amount {
        self.pools
            .get(pool_id)
            .and_then(|pool| pool.delegators.get(delegator))
            .map(|position| position.amount_at(epoch))
            .unwrap_or_else(Amount::zero)
    }

    /// Largest instant withdrawal `staker` may make from `pool` right now
    pub fn max_withdraw_allowed(&self, pool: &Pool, staker: &Address) -> Amount {
        let current = pool.stake_of(staker);
        if !pool.in_validator_set() {
            return current;
        }
        pool.staked_in(staker, self.epoch.number).min(current)
    }

    pub fn is_pool_banned(&self, pool_id: &Address, block: BlockNumber) -> bool {
        self.pools
            .get(pool_id)
            .map(|pool| pool.is_banned(block))
            .unwrap_or(false)
    }

    pub fn are_delegators_banned(&self, pool_id: &Address, block: BlockNumber) -> bool {
        self.pools
            .get(pool_id)
            .map(|pool| pool.are_delegators_banned(block))
            .unwrap_or(false)
    }

    fn electable(&self, block: BlockNumber) -> impl Iterator<Item = &Pool> {
        let min = &self.params.candidate_min_stake;
        self.pools().filter(move |pool| {
            pool.status.is_electable()
                && !pool.is_banned(block)
                && pool.own_stake >= *min
                && !pool.total_stake.is_zero()
        })
    }

    fn ensure_window(&self, block: BlockNumber) -> LedgerResult<()> {
        if self
            .epoch
            .stake_withdraw_allowed(block, self.params.stake_withdraw_disallow_period)
        {
            return Ok(());
        }
        Err(LedgerError::OutsideStakingWindow {
            block,
            last_allowed: self
                .epoch
                .end_block()
                .saturating_sub(self.params.stake_withdraw_disallow_period),
        })
    }

    fn check_new_identity(&self, staking: &Address, mining: &Address) -> LedgerResult<()> {
        if staking.is_zero() || mining.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if self.pools.contains_key(staking) {
            return Err(LedgerError::PoolAlreadyExists(*staking));
        }
        if staking == mining || self.staking_by_mining.contains_key(staking) {
            return Err(LedgerError::IdentityInUse(*staking));
        }
        if self.pools.contains_key(mining) || self.staking_by_mining.contains_key(mining) {
            return Err(LedgerError::IdentityInUse(*mining));
        }
        Ok(())
    }

    /// A remaining position must be zero or at least the relevant minimum
    fn check_remaining(&self, pool: &Pool, staker: &Address, remaining: &Amount) -> LedgerResult<()> {
        let is_owner = *staker == pool.staking_address;
        if remaining.is_zero() {
            if is_owner && pool.unremovable {
                return Err(LedgerError::UnremovablePool(pool.staking_address));
            }
            return Ok(());
        }
        let required = if is_owner {
            &self.params.candidate_min_stake
        } else {
            &self.params.delegator_min_stake
        };
        if remaining < required {
            return Err(LedgerError::InsufficientStake {
                required: required.clone(),
                provided: remaining.clone(),
            });
        }
        Ok(())
    }

    fn insert_pool(&mut self, pool: Pool) {
        self.staking_by_mining
            .insert(pool.mining_address, pool.staking_address);
        self.registration_order.push(pool.staking_address);
        self.pools.insert(pool.staking_address, pool);
    }

    fn pool_ref(&self, pool_id: &Address) -> LedgerResult<&Pool> {
        self.pools
            .get(pool_id)
            .ok_or(LedgerError::PoolNotFound(*pool_id))
    }

    fn pool_mut(&mut self, pool_id: &Address) -> LedgerResult<&mut Pool> {
        self.pools
            .get_mut(pool_id)
            .ok_or(LedgerError::PoolNotFound(*pool_id))
    }
}

impl StakeReader for StakeLedger {
    fn staking_epoch(&self) -> StakingEpoch {
        self.epoch
    }

    fn staking_address_of(&self, mining: &Address) -> Option<Address> {
        self.staking_by_mining.get(mining).copied()
    }

    fn mining_address_of(&self, staking: &Address) -> Option<Address> {
        self.pools.get(staking).map(|pool| pool.mining_address)
    }

    fn pool_stake(&self, staking: &Address) -> Option<(Amount, Amount)> {
        self.pools
            .get(staking)
            .map(|pool| (pool.own_stake.clone(), pool.total_stake.clone()))
    }

    fn delegator_stakes_at(&self, staking: &Address, epoch: EpochNumber) -> Vec<(Address, Amount)> {
        self.pools
            .get(staking)
            .map(|pool| pool.delegator_stakes_at(epoch))
            .unwrap_or_default()
    }

    fn is_banned(&self, staking: &Address, block: BlockNumber) -> bool {
        self.is_pool_banned(staking, block)
    }
}

fn active_delegators(pool: &Pool) -> usize {
    pool.delegators
        .values()
        .filter(|position| !position.amount.is_zero())
        .count()
}

fn check_withdraw_bans(pool: &Pool, staker: &Address, block: BlockNumber) -> LedgerResult<()> {
    if *staker == pool.staking_address {
        if pool.is_banned(block) {
            return Err(LedgerError::PoolBanned {
                pool: pool.staking_address,
                until: pool.banned_until,
            });
        }
    } else if pool.are_delegators_banned(block) {
        return Err(LedgerError::DelegatorsBanned {
            pool: pool.staking_address,
            until: pool.delegators_banned_until,
        });
    }
    Ok(())
}

/// Caller has already checked `amount <= stake_of(staker)`
fn decrease_stake(pool: &mut Pool, staker: &Address, amount: &Amount, epoch: EpochNumber) {
    if *staker == pool.staking_address {
        pool.own_stake = pool.own_stake.saturating_sub(amount);
        pool.own_staked_this_epoch.sub(epoch, amount);
    } else if let Some(position) = pool.delegators.get_mut(staker) {
        let remaining = position.amount.saturating_sub(amount);
        position.set_amount(epoch, remaining);
        position.staked_this_epoch_mut().sub(epoch, amount);
    }
    pool.total_stake = pool.total_stake.saturating_sub(amount);
}

fn mark_owner_exit(pool: &mut Pool) {
    if pool.own_stake.is_zero() && pool.status != PoolStatus::Inactive {
        pool.status = if pool.in_validator_set() {
            PoolStatus::ToBeRemoved
        } else {
            PoolStatus::Inactive
        };
        tracing::info!(pool = %pool.staking_address, status = ?pool.status, "pool owner exited");
    }
}

fn deactivate(pool: &mut Pool) -> LedgerResult<PoolStatus> {
    if matches!(pool.status, PoolStatus::Inactive | PoolStatus::ToBeRemoved) {
        return Err(LedgerError::PoolInactive(pool.staking_address));
    }
    pool.status = if pool.in_validator_set() {
        PoolStatus::ToBeRemoved
    } else {
        PoolStatus::Inactive
    };
    tracing::info!(pool = %pool.staking_address, status = ?pool.status, "pool removed");
    Ok(pool.status)
}

// ledger/src/pool.rs

use serde::{Deserialize, Serialize};
use staking_core::{Amount, BlockNumber, EpochNumber, StakeAmount};
use staking_crypto::Address;
use std::collections::BTreeMap;

/// Pool lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Registered and eligible, not in the current or pending set
    Candidate,
    /// In the pending set only, waiting for the change to be finalized
    ToBeElected,
    /// In the current validator set
    Active,
    /// Owner is exiting while the pool still sits in a validator set
    ToBeRemoved,
    /// Not eligible: exited, evicted or banned. Never deleted.
    Inactive,
}

impl PoolStatus {
    /// Statuses that may take part in the next election
    pub fn is_electable(&self) -> bool {
        matches!(self, PoolStatus::Candidate | PoolStatus::ToBeElected | PoolStatus::Active)
    }
}

/// Stake placed within a given epoch.
///
/// Reads for any other epoch yield zero, so the value never needs an
/// explicit reset at epoch boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochStake {
    epoch: EpochNumber,
    amount: Amount,
}

impl EpochStake {
    pub fn amount_in(&self, epoch: EpochNumber) -> Amount {
        if self.epoch == epoch {
            self.amount.clone()
        } else {
            Amount::zero()
        }
    }

    pub(crate) fn add(&mut self, epoch: EpochNumber, amount: &Amount) {
        let base = self.amount_in(epoch);
        self.epoch = epoch;
        self.amount = &base + amount;
    }

    pub(crate) fn sub(&mut self, epoch: EpochNumber, amount: &Amount) {
        let base = self.amount_in(epoch);
        self.epoch = epoch;
        self.amount = base.saturating_sub(amount);
    }
}

/// A delegator's position in one pool.
///
/// Every change made during epoch `E` is recorded as the amount valid from
/// `E + 1`, so the amount that counted in any past epoch stays answerable
/// without snapshotting every delegator at every boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorStake {
    /// Live amount (excludes ordered withdrawals)
    pub amount: StakeAmount,
    /// First epoch of the position's latest run of non-zero stake
    pub first_epoch: EpochNumber,
    /// Last epoch in which the position counted, once it dropped to zero
    pub last_epoch: Option<EpochNumber>,
    staked_this_epoch: EpochStake,
    history: BTreeMap<EpochNumber, Amount>,
}

impl DelegatorStake {
    pub(crate) fn new(current_epoch: EpochNumber) -> Self {
        Self {
            amount: Amount::zero(),
            first_epoch: current_epoch + 1,
            last_epoch: None,
            staked_this_epoch: EpochStake::default(),
            history: BTreeMap::new(),
        }
    }

    /// Amount that counted for rewards in `epoch`
    pub fn amount_at(&self, epoch: EpochNumber) -> Amount {
        self.history
            .range(..=epoch)
            .next_back()
            .map(|(_, amount)| amount.clone())
            .unwrap_or_else(Amount::zero)
    }

    pub fn staked_in(&self, epoch: EpochNumber) -> Amount {
        self.staked_this_epoch.amount_in(epoch)
    }

    pub(crate) fn set_amount(&mut self, current_epoch: EpochNumber, amount: Amount) {
        if amount.is_zero() {
            self.last_epoch = Some(current_epoch);
        } else {
            // re-entry after at least one epoch at zero starts a new run
            if matches!(self.last_epoch, Some(last) if last < current_epoch) {
                self.first_epoch = current_epoch + 1;
            }
            self.last_epoch = None;
        }
        self.history.insert(current_epoch + 1, amount.clone());
        self.amount = amount;
    }

    pub(crate) fn staked_this_epoch_mut(&mut self) -> &mut EpochStake {
        &mut self.staked_this_epoch
    }
}

/// Withdrawal ordered during `epoch`, claimable once the epoch has passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalOrder {
    /// Stake waiting to be claimed
    pub amount: StakeAmount,
    /// Epoch of the latest order
    pub epoch: EpochNumber,
}

/// A staking identity aggregating its own stake and delegated stake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Owner identity; pool id
    pub staking_address: Address,
    /// Identity that produces blocks
    pub mining_address: Address,
    /// Lifecycle status
    pub status: PoolStatus,
    /// Owner's live stake (excludes ordered withdrawals)
    pub own_stake: StakeAmount,
    /// Own plus delegated live stake; the pool's selection weight
    pub total_stake: StakeAmount,
    pub(crate) own_staked_this_epoch: EpochStake,
    /// Delegator positions, kept after they drop to zero
    pub delegators: BTreeMap<Address, DelegatorStake>,
    /// Pending ordered withdrawals by staker
    pub withdrawal_orders: BTreeMap<Address, WithdrawalOrder>,
    /// Member of the current validator set
    pub in_current_set: bool,
    /// Member of the proposed validator set
    pub in_pending_set: bool,
    /// Exempt from ejection and owner removal
    pub unremovable: bool,
    /// Excluded from election before this block
    pub banned_until: BlockNumber,
    /// Delegators cannot withdraw before this block
    pub delegators_banned_until: BlockNumber,
    /// Block of registration
    pub registered_at: BlockNumber,
}

impl Pool {
    pub(crate) fn new(
        staking_address: Address,
        mining_address: Address,
        status: PoolStatus,
        registered_at: BlockNumber,
    ) -> Self {
        Self {
            staking_address,
            mining_address,
            status,
            own_stake: Amount::zero(),
            total_stake: Amount::zero(),
            own_staked_this_epoch: EpochStake::default(),
            delegators: BTreeMap::new(),
            withdrawal_orders: BTreeMap::new(),
            in_current_set: false,
            in_pending_set: false,
            unremovable: false,
            banned_until: 0,
            delegators_banned_until: 0,
            registered_at,
        }
    }

    pub fn in_validator_set(&self) -> bool {
        self.in_current_set || self.in_pending_set
    }

    pub fn is_banned(&self, block: BlockNumber) -> bool {
        block < self.banned_until
    }

    pub fn are_delegators_banned(&self, block: BlockNumber) -> bool {
        block < self.delegators_banned_until
    }

    /// Live position of `staker` (the owner's own stake or a delegation)
    pub fn stake_of(&self, staker: &Address) -> Amount {
        if *staker == self.staking_address {
            return self.own_stake.clone();
        }
        self.delegators
            .get(staker)
            .map(|d| d.amount.clone())
            .unwrap_or_else(Amount::zero)
    }

    /// Stake `staker` placed during `epoch`
    pub fn staked_in(&self, staker: &Address, epoch: EpochNumber) -> Amount {
        if *staker == self.staking_address {
            return self.own_staked_this_epoch.amount_in(epoch);
        }
        self.delegators
            .get(staker)
            .map(|d| d.staked_in(epoch))
            .unwrap_or_else(Amount::zero)
    }

    pub fn ordered_amount(&self, staker: &Address) -> Amount {
        self.withdrawal_orders
            .get(staker)
            .map(|o| o.amount.clone())
            .unwrap_or_else(Amount::zero)
    }

    /// Delegated stake that counted in `epoch`
    pub fn delegator_stakes_at(&self, epoch: EpochNumber) -> Vec<(Address, Amount)> {
        self.delegators
            .iter()
            .map(|(address, stake)| (*address, stake.amount_at(epoch)))
            .filter(|(_, amount)| !amount.is_zero())
            .collect()
    }

    /// `total_stake == own_stake + Σ delegator stake`
    pub fn stake_invariant_holds(&self) -> bool {
        let delegated: Amount = self.delegators.values().map(|d| &d.amount).sum();
        self.total_stake == &self.own_stake + &delegated
    }

    /// Status implied by set membership, keeping exits and deactivation sticky
    pub(crate) fn refresh_status(&mut self, candidate_min_stake: &Amount) {
        self.status = match (self.status, self.in_validator_set()) {
            (PoolStatus::ToBeRemoved, true) | (PoolStatus::Inactive, true) => self.status,
            (_, true) if self.in_current_set => PoolStatus::Active,
            (_, true) => PoolStatus::ToBeElected,
            (PoolStatus::ToBeRemoved, false) | (PoolStatus::Inactive, false) => PoolStatus::Inactive,
            (_, false) if self.own_stake < *candidate_min_stake => PoolStatus::Inactive,
            (_, false) => PoolStatus::Candidate,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_stake_resets_across_epochs() {
        let mut stake = EpochStake::default();
        stake.add(3, &Amount::from_u64(10));
        stake.add(3, &Amount::from_u64(5));
        assert_eq!(stake.amount_in(3), Amount::from_u64(15));
        assert_eq!(stake.amount_in(4), Amount::zero());

        stake.add(4, &Amount::from_u64(1));
        assert_eq!(stake.amount_in(4), Amount::from_u64(1));
        stake.sub(4, &Amount::from_u64(7));
        assert_eq!(stake.amount_in(4), Amount::zero());
    }

    #[test]
    fn test_delegator_history() {
        let mut stake = DelegatorStake::new(2);
        assert_eq!(stake.first_epoch, 3);
        stake.set_amount(2, Amount::from_u64(100));
        stake.set_amount(5, Amount::from_u64(40));

        assert_eq!(stake.amount_at(2), Amount::zero());
        assert_eq!(stake.amount_at(3), Amount::from_u64(100));
        assert_eq!(stake.amount_at(5), Amount::from_u64(100));
        assert_eq!(stake.amount_at(6), Amount::from_u64(40));
        assert_eq!(stake.amount_at(60), Amount::from_u64(40));

        stake.set_amount(7, Amount::zero());
        assert_eq!(stake.last_epoch, Some(7));
        assert_eq!(stake.amount_at(7), Amount::from_u64(40));
        assert_eq!(stake.amount_at(8), Amount::zero());
    }

    #[test]
    fn test_reentry_starts_a_new_run() {
        let mut stake = DelegatorStake::new(2);
        stake.set_amount(2, Amount::from_u64(100));
        stake.set_amount(4, Amount::zero());

        // refunded within the epoch it dropped: no gap
        stake.set_amount(4, Amount::from_u64(50));
        assert_eq!(stake.first_epoch, 3);
        assert_eq!(stake.last_epoch, None);

        stake.set_amount(5, Amount::zero());
        stake.set_amount(9, Amount::from_u64(20));
        assert_eq!(stake.first_epoch, 10);
        assert_eq!(stake.last_epoch, None);
        assert_eq!(stake.amount_at(8), Amount::zero());
        assert_eq!(stake.amount_at(10), Amount::from_u64(20));
    }

    #[test]
    fn test_refresh_status() {
        let min = Amount::from_u64(10);
        let mut pool = Pool::new(Address::derive(b"s"), Address::derive(b"m"), PoolStatus::Candidate, 1);
        pool.own_stake = Amount::from_u64(10);

        pool.in_pending_set = true;
        pool.refresh_status(&min);
        assert_eq!(pool.status, PoolStatus::ToBeElected);

        pool.in_current_set = true;
        pool.in_pending_set = false;
        pool.refresh_status(&min);
        assert_eq!(pool.status, PoolStatus::Active);

        pool.status = PoolStatus::ToBeRemoved;
        pool.refresh_status(&min);
        assert_eq!(pool.status, PoolStatus::ToBeRemoved);

        pool.in_current_set = false;
        pool.refresh_status(&min);
        assert_eq!(pool.status, PoolStatus::Inactive);
    }
}

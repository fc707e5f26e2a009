// consensus/src/validator_set.rs

use crate::beacon::RandomBeacon;
use crate::reporting::{BanReason, BanRecord, MaliceReport, ReportBook};
use crate::selection::ValidatorSelector;
use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use stake_ledger::{StakeLedger, StakeReader};
use staking_core::{
    BlockNumber, CallContext, CoreError, GovernanceCall, StakingParams, SystemAuthority, SystemCall,
};
use staking_crypto::Address;
use std::collections::{BTreeMap, BTreeSet};

/// Membership queries other components gate on
pub trait ValidatorMembership {
    fn is_current_validator(&self, mining: &Address) -> bool;

    fn current_validators(&self) -> &[Address];
}

/// Notifications for the host's block-production layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorSetEvent {
    /// A new set was proposed and awaits finalization
    InitiateChange {
        validators: Vec<Address>,
        block: BlockNumber,
    },
    /// The pending set became current
    ChangeFinalized {
        validators: Vec<Address>,
        block: BlockNumber,
    },
    /// A validator was removed from the current set mid-epoch;
    /// `validators` is the set left serving
    ValidatorEjected {
        validator: Address,
        validators: Vec<Address>,
        block: BlockNumber,
    },
    /// Ejection postponed to the next rotation to keep the set non-empty
    EjectionDeferred {
        validator: Address,
        block: BlockNumber,
    },
    ValidatorBanned {
        validator: Address,
        until: BlockNumber,
        reason: BanReason,
    },
}

/// Result of a malice report or ban request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Stored; quorum not reached yet
    Recorded { votes: usize, validators: usize },
    Ejected,
    Deferred,
    /// The unremovable validator is never ejected
    Exempt,
}

/// Authoritative current/pending/previous validator lists (mining addresses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorSetManager {
    initialized: bool,
    current: Vec<Address>,
    pending: Vec<Address>,
    previous: Vec<Address>,
    change_pending: bool,
    change_request_count: u64,
    validator_set_apply_block: BlockNumber,
    unremovable: Option<Address>,
    max_validators: usize,
    validator_ban_duration: u64,
    delegators_ban_duration: u64,
    malice_report_max_age: u64,
    reports: ReportBook,
    deferred: BTreeMap<Address, BanReason>,
    events: Vec<ValidatorSetEvent>,
}

impl ValidatorSetManager {
    pub fn new(params: &StakingParams) -> Self {
        Self {
            initialized: false,
            current: Vec::new(),
            pending: Vec::new(),
            previous: Vec::new(),
            change_pending: false,
            change_request_count: 0,
            validator_set_apply_block: 0,
            unremovable: None,
            max_validators: params.max_validators,
            validator_ban_duration: params.validator_ban_duration,
            delegators_ban_duration: params.delegators_ban_duration,
            malice_report_max_age: params.malice_report_max_age,
            reports: ReportBook::new(),
            deferred: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Install the genesis set. `unremovable` is a staking address.
    pub fn initialize(
        &mut self,
        ledger: &mut StakeLedger,
        genesis: &[Address],
        unremovable: Option<Address>,
    ) -> ConsensusResult<()> {
        if self.initialized {
            return Err(ConsensusError::AlreadyInitialized);
        }
        if genesis.is_empty() {
            return Err(ConsensusError::EmptyValidatorSet);
        }
        for mining in genesis {
            staking_of(ledger, mining)?;
        }
        if let Some(pool) = unremovable {
            ledger.set_unremovable(&pool, true)?;
        }

        self.current = genesis.to_vec();
        self.unremovable = unremovable;
        self.initialized = true;
        self.sync_ledger(ledger);

        tracing::info!(validators = genesis.len(), unremovable = ?unremovable, "validator set initialized");
        Ok(())
    }

    /// Draw the next validator set and propose it.
    ///
    /// Deferred ejections are turned into bans first. An unfinalized
    /// proposal is replaced. When nothing is electable the current set is
    /// kept and no change is proposed.
    pub fn rotate(
        &mut self,
        cap: &SystemCall,
        ledger: &mut StakeLedger,
        beacon: &RandomBeacon,
    ) -> ConsensusResult<Vec<Address>> {
        self.ensure_initialized()?;
        let block = cap.block();
        self.apply_deferred_bans(block, ledger)?;

        if self.change_pending {
            tracing::warn!(pending = ?self.pending, "replacing unfinalized validator set proposal");
        }

        let likelihood = ledger.likelihood(block);
        let selector = ValidatorSelector::new(self.max_validators);
        let selected = selector.select(&likelihood, self.unremovable, beacon.seed())?;
        self.reports
            .prune(block.saturating_sub(self.malice_report_max_age));

        if selected.is_empty() {
            tracing::warn!(block, "no electable pools, keeping the current validator set");
            self.pending.clear();
            self.change_pending = false;
            self.sync_ledger(ledger);
            return Ok(self.current.clone());
        }

        let pending = selected
            .iter()
            .map(|pool| {
                ledger
                    .mining_address_of(pool)
                    .ok_or(ConsensusError::UnknownValidator(*pool))
            })
            .collect::<ConsensusResult<Vec<_>>>()?;

        self.pending = pending;
        self.change_pending = true;
        self.change_request_count += 1;
        self.events.push(ValidatorSetEvent::InitiateChange {
            validators: self.pending.clone(),
            block,
        });
        self.sync_ledger(ledger);

        tracing::info!(block, validators = self.pending.len(), "validator set change proposed");
        Ok(self.pending.clone())
    }

    /// Host confirmed the proposal: pending becomes current
    pub fn finalize(&mut self, cap: &SystemCall, ledger: &mut StakeLedger) -> ConsensusResult<Vec<Address>> {
        self.ensure_initialized()?;
        if !self.change_pending {
            return Err(ConsensusError::NoPendingChange);
        }
        let next = std::mem::take(&mut self.pending);
        self.previous = std::mem::replace(&mut self.current, next);
        self.change_pending = false;
        self.validator_set_apply_block = cap.block();
        self.events.push(ValidatorSetEvent::ChangeFinalized {
            validators: self.current.clone(),
            block: cap.block(),
        });
        self.sync_ledger(ledger);

        tracing::info!(block = cap.block(), validators = self.current.len(), "validator set finalized");
        Ok(self.current.clone())
    }

    /// Accuse `accused` of misbehaving at `block_number`.
    ///
    /// The accused is ejected and banned once `votes * 2 > current set size`.
    pub fn report_malicious(
        &mut self,
        ctx: &CallContext,
        ledger: &mut StakeLedger,
        accused: Address,
        block_number: BlockNumber,
        proof: Vec<u8>,
    ) -> ConsensusResult<ReportOutcome> {
        self.ensure_initialized()?;
        let reporter = ctx.caller;
        if !self.is_validator(&reporter) {
            return Err(ConsensusError::NotValidator(reporter));
        }
        let reporter_pool = staking_of(ledger, &reporter)?;
        if ledger.is_pool_banned(&reporter_pool, ctx.block) {
            return Err(ConsensusError::ReporterBanned(reporter));
        }
        if accused == reporter {
            return Err(ConsensusError::SelfReport);
        }
        if !self.is_validator(&accused) {
            return Err(ConsensusError::NotValidator(accused));
        }
        let accused_pool = staking_of(ledger, &accused)?;
        if ledger.is_pool_banned(&accused_pool, ctx.block) || self.deferred.contains_key(&accused) {
            return Err(ConsensusError::AlreadyBanned(accused));
        }
        if block_number > ctx.block {
            return Err(ConsensusError::ReportFromFuture {
                block: block_number,
                current: ctx.block,
            });
        }
        if ctx.block - block_number > self.malice_report_max_age {
            return Err(ConsensusError::ReportTooOld {
                block: block_number,
                current: ctx.block,
            });
        }

        self.reports.record_report(
            accused,
            block_number,
            MaliceReport {
                reporter,
                reported_at: ctx.block,
                proof,
            },
        )?;

        let votes = self.reports.votes(&accused, block_number, &self.current);
        let validators = self.current.len();
        tracing::debug!(reporter = %reporter, accused = %accused, votes, validators, "malice reported");
        if votes * 2 <= validators {
            return Ok(ReportOutcome::Recorded { votes, validators });
        }

        tracing::info!(accused = %accused, votes, validators, "malice report quorum reached");
        self.remove_malicious(ctx.block, ledger, accused, BanReason::Malicious)
    }

    /// Ban decided by the governance module, applied like a quorum ejection
    pub fn apply_governance_ban(
        &mut self,
        _cap: &GovernanceCall,
        block: BlockNumber,
        ledger: &mut StakeLedger,
        mining: Address,
        reason: BanReason,
    ) -> ConsensusResult<ReportOutcome> {
        self.ensure_initialized()?;
        let pool = staking_of(ledger, &mining)?;
        if ledger.is_pool_banned(&pool, block) || self.deferred.contains_key(&mining) {
            return Err(ConsensusError::AlreadyBanned(mining));
        }
        self.remove_malicious(block, ledger, mining, reason)
    }

    /// Clear the unremovable flag; allowed once, to the pool itself or the admin
    pub fn clear_unremovable(
        &mut self,
        ctx: &CallContext,
        authority: &SystemAuthority,
        ledger: &mut StakeLedger,
    ) -> ConsensusResult<()> {
        let pool = self
            .unremovable
            .ok_or(ConsensusError::NoUnremovableValidator)?;
        if ctx.caller != pool && !authority.is_admin(&ctx.caller) {
            return Err(CoreError::Unauthorized {
                caller: ctx.caller,
                role: "unremovable pool or admin",
            }
            .into());
        }
        ledger.set_unremovable(&pool, false)?;
        self.unremovable = None;
        tracing::info!(pool = %pool, by = %ctx.caller, "unremovable flag cleared");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn pending_validators(&self) -> &[Address] {
        &self.pending
    }

    pub fn previous_validators(&self) -> &[Address] {
        &self.previous
    }

    /// True between a proposal and its finalization
    pub fn is_change_pending(&self) -> bool {
        self.change_pending
    }

    pub fn change_request_count(&self) -> u64 {
        self.change_request_count
    }

    pub fn validator_set_apply_block(&self) -> BlockNumber {
        self.validator_set_apply_block
    }

    pub fn is_validator(&self, mining: &Address) -> bool {
        self.current.contains(mining)
    }

    pub fn is_validator_or_pending(&self, mining: &Address) -> bool {
        self.is_validator(mining) || (self.change_pending && self.pending.contains(mining))
    }

    /// Staking address of the unremovable pool, if still flagged
    pub fn unremovable(&self) -> Option<Address> {
        self.unremovable
    }

    pub fn is_ejection_deferred(&self, mining: &Address) -> bool {
        self.deferred.contains_key(mining)
    }

    pub fn ban_counter(&self, mining: &Address) -> u64 {
        self.reports.ban_counter(mining)
    }

    pub fn ban_record(&self, mining: &Address) -> Option<&BanRecord> {
        self.reports.ban_record(mining)
    }

    pub fn reports(&self) -> &ReportBook {
        &self.reports
    }

    pub fn drain_events(&mut self) -> Vec<ValidatorSetEvent> {
        std::mem::take(&mut self.events)
    }

    /// Staking addresses of the current set followed by pending-only pools
    pub fn snapshot_pools(&self, reader: &impl StakeReader) -> Vec<Address> {
        let mut pools: Vec<Address> = Vec::new();
        let pending: &[Address] = if self.change_pending {
            self.pending.as_slice()
        } else {
            &[]
        };
        for mining in self.current.iter().chain(pending.iter()) {
            if let Some(pool) = reader.staking_address_of(mining) {
                if !pools.contains(&pool) {
                    pools.push(pool);
                }
            }
        }
        pools
    }

    fn remove_malicious(
        &mut self,
        block: BlockNumber,
        ledger: &mut StakeLedger,
        mining: Address,
        reason: BanReason,
    ) -> ConsensusResult<ReportOutcome> {
        let pool = staking_of(ledger, &mining)?;
        if Some(pool) == self.unremovable {
            tracing::warn!(validator = %mining, "unremovable validator exempt from ejection");
            return Ok(ReportOutcome::Exempt);
        }

        let was_current = self.is_validator(&mining);
        if was_current && self.current.len() == 1 {
            self.deferred.insert(mining, reason);
            self.events
                .push(ValidatorSetEvent::EjectionDeferred { validator: mining, block });
            tracing::warn!(validator = %mining, "ejection deferred, validator set would be empty");
            return Ok(ReportOutcome::Deferred);
        }

        self.current.retain(|v| *v != mining);
        if self.pending.contains(&mining) {
            self.pending.retain(|v| *v != mining);
            if self.pending.is_empty() && self.change_pending {
                self.change_pending = false;
                tracing::warn!(validator = %mining, "proposal emptied by ejection, withdrawn");
            }
        }
        self.ban(block, ledger, mining, pool, reason)?;
        if was_current {
            self.change_request_count += 1;
            self.events.push(ValidatorSetEvent::ValidatorEjected {
                validator: mining,
                validators: self.current.clone(),
                block,
            });
            tracing::info!(validator = %mining, remaining = self.current.len(), "validator ejected");
        }
        self.sync_ledger(ledger);
        Ok(ReportOutcome::Ejected)
    }

    fn apply_deferred_bans(&mut self, block: BlockNumber, ledger: &mut StakeLedger) -> ConsensusResult<()> {
        for (mining, reason) in std::mem::take(&mut self.deferred) {
            let pool = staking_of(ledger, &mining)?;
            self.ban(block, ledger, mining, pool, reason)?;
        }
        Ok(())
    }

    fn ban(
        &mut self,
        block: BlockNumber,
        ledger: &mut StakeLedger,
        mining: Address,
        pool: Address,
        reason: BanReason,
    ) -> ConsensusResult<()> {
        let until = block + self.validator_ban_duration;
        ledger.ban_pool(&pool, until, block + self.delegators_ban_duration)?;
        self.reports.record_ban(mining, reason, until);
        self.events.push(ValidatorSetEvent::ValidatorBanned {
            validator: mining,
            until,
            reason,
        });
        Ok(())
    }

    fn sync_ledger(&self, ledger: &mut StakeLedger) {
        let current: BTreeSet<Address> = self
            .current
            .iter()
            .filter_map(|mining| ledger.staking_address_of(mining))
            .collect();
        let pending: BTreeSet<Address> = if self.change_pending {
            self.pending
                .iter()
                .filter_map(|mining| ledger.staking_address_of(mining))
                .collect()
        } else {
            BTreeSet::new()
        };
        ledger.sync_validator_sets(&current, &pending);
    }

    fn ensure_initialized(&self) -> ConsensusResult<()> {
        if !self.initialized {
            return Err(ConsensusError::NotInitialized);
        }
        Ok(())
    }
}

impl ValidatorMembership for ValidatorSetManager {
    fn is_current_validator(&self, mining: &Address) -> bool {
        self.is_validator(mining)
    }

    fn current_validators(&self) -> &[Address] {
        &self.current
    }
}

fn staking_of(ledger: &StakeLedger, mining: &Address) -> ConsensusResult<Address> {
    ledger
        .staking_address_of(mining)
        .ok_or(ConsensusError::UnknownValidator(*mining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stake_ledger::PoolStatus;
    use staking_core::{Amount, BalanceLedger, TokenLedger};

    fn params() -> StakingParams {
        StakingParams {
            epoch_duration: 100,
            stake_withdraw_disallow_period: 10,
            collect_round_length: 10,
            candidate_min_stake: Amount::from_u64(1_000),
            delegator_min_stake: Amount::from_u64(100),
            max_validators: 5,
            max_candidates: 10,
            max_delegators_per_pool: 10,
            validator_ban_duration: 1_000,
            delegators_ban_duration: 200,
            malice_report_max_age: 100,
            ..Default::default()
        }
    }

    fn staking(name: &str) -> Address {
        Address::derive(name.as_bytes())
    }

    fn mining(name: &str) -> Address {
        Address::derive(format!("{}-mining", name).as_bytes())
    }

    fn authority() -> SystemAuthority {
        SystemAuthority::new(staking("system"), staking("admin"))
            .unwrap()
            .with_governance(staking("governance"))
    }

    fn system_call(block: BlockNumber) -> SystemCall {
        authority()
            .authorize_system(&CallContext::new(staking("system"), block))
            .unwrap()
    }

    fn setup(genesis: &[&str], unremovable: Option<&str>) -> (StakeLedger, BalanceLedger, ValidatorSetManager) {
        let params = params();
        let mut ledger = StakeLedger::new(params.clone()).unwrap();
        let mut token = BalanceLedger::new();
        for name in genesis {
            ledger
                .add_genesis_pool(&mut token, staking(name), mining(name), Amount::from_u64(1_000))
                .unwrap();
        }
        let mut manager = ValidatorSetManager::new(&params);
        let set: Vec<Address> = genesis.iter().map(|n| mining(n)).collect();
        manager
            .initialize(&mut ledger, &set, unremovable.map(staking))
            .unwrap();
        (ledger, token, manager)
    }

    #[test]
    fn test_initialize_once() {
        let (mut ledger, _, mut manager) = setup(&["a", "b"], None);
        assert!(matches!(
            manager.initialize(&mut ledger, &[mining("a")], None),
            Err(ConsensusError::AlreadyInitialized)
        ));
        assert_eq!(manager.current_validators(), &[mining("a"), mining("b")]);
        assert!(!manager.is_change_pending());

        let mut fresh = ValidatorSetManager::new(&params());
        assert!(matches!(
            fresh.initialize(&mut ledger, &[], None),
            Err(ConsensusError::EmptyValidatorSet)
        ));
        assert!(matches!(
            fresh.initialize(&mut ledger, &[mining("zz")], None),
            Err(ConsensusError::UnknownValidator(_))
        ));
    }

    #[test]
    fn test_rotate_and_finalize() {
        let (mut ledger, mut token, mut manager) = setup(&["a", "b", "c"], None);
        token.mint(&staking("d"), &Amount::from_u64(5_000)).unwrap();
        ledger
            .add_pool(&CallContext::new(staking("d"), 5), &mut token, mining("d"), Amount::from_u64(1_000))
            .unwrap();
        let beacon = RandomBeacon::new(10);

        let pending = manager.rotate(&system_call(100), &mut ledger, &beacon).unwrap();
        assert_eq!(pending.len(), 4);
        assert!(manager.is_change_pending());
        assert!(manager.is_validator_or_pending(&mining("d")));
        assert!(!manager.is_validator(&mining("d")));
        assert_eq!(ledger.pool(&staking("d")).unwrap().status, PoolStatus::ToBeElected);
        assert_eq!(manager.change_request_count(), 1);

        let current = manager.finalize(&system_call(101), &mut ledger).unwrap();
        assert_eq!(current, pending);
        assert_eq!(manager.previous_validators().len(), 3);
        assert_eq!(manager.validator_set_apply_block(), 101);
        assert_eq!(ledger.pool(&staking("d")).unwrap().status, PoolStatus::Active);

        let events = manager.drain_events();
        assert!(matches!(events[0], ValidatorSetEvent::InitiateChange { block: 100, .. }));
        assert!(matches!(events[1], ValidatorSetEvent::ChangeFinalized { block: 101, .. }));
        assert!(manager.drain_events().is_empty());

        assert!(matches!(
            manager.finalize(&system_call(102), &mut ledger),
            Err(ConsensusError::NoPendingChange)
        ));
    }

    #[test]
    fn test_rotate_replaces_unfinalized_proposal() {
        let (mut ledger, _, mut manager) = setup(&["a", "b"], None);
        let beacon = RandomBeacon::new(10);
        manager.rotate(&system_call(100), &mut ledger, &beacon).unwrap();
        manager.rotate(&system_call(200), &mut ledger, &beacon).unwrap();
        assert_eq!(manager.change_request_count(), 2);
        assert!(manager.is_change_pending());
    }

    #[test]
    fn test_quorum_ejection_threshold() {
        let (mut ledger, _, mut manager) = setup(&["a", "b", "c", "d"], None);
        let accused = mining("d");

        for reporter in ["a", "b"] {
            let outcome = manager
                .report_malicious(&CallContext::new(mining(reporter), 50), &mut ledger, accused, 45, vec![])
                .unwrap();
            assert!(matches!(outcome, ReportOutcome::Recorded { validators: 4, .. }));
        }
        assert!(manager.is_validator(&accused));

        let outcome = manager
            .report_malicious(&CallContext::new(mining("c"), 50), &mut ledger, accused, 45, vec![])
            .unwrap();
        assert_eq!(outcome, ReportOutcome::Ejected);
        assert!(!manager.is_validator(&accused));
        assert_eq!(manager.current_validators().len(), 3);
        assert!(ledger.is_pool_banned(&staking("d"), 50));
        assert!(ledger.are_delegators_banned(&staking("d"), 249));
        assert!(!ledger.are_delegators_banned(&staking("d"), 250));
        assert_eq!(manager.ban_counter(&accused), 1);
        assert_eq!(manager.ban_record(&accused).unwrap().last_reason, BanReason::Malicious);
        assert!(!ledger.pools_to_be_elected(60).contains(&staking("d")));

        let remaining = vec![mining("a"), mining("b"), mining("c")];
        let ejected = manager
            .drain_events()
            .into_iter()
            .find_map(|event| match event {
                ValidatorSetEvent::ValidatorEjected { validator, validators, block } => {
                    Some((validator, validators, block))
                }
                _ => None,
            });
        assert_eq!(ejected, Some((accused, remaining, 50)));
    }

    #[test]
    fn test_report_preconditions() {
        let (mut ledger, _, mut manager) = setup(&["a", "b", "c"], None);
        let ctx = CallContext::new(mining("a"), 200);

        assert!(matches!(
            manager.report_malicious(&ctx, &mut ledger, mining("a"), 199, vec![]),
            Err(ConsensusError::SelfReport)
        ));
        assert!(matches!(
            manager.report_malicious(&CallContext::new(mining("x"), 200), &mut ledger, mining("b"), 199, vec![]),
            Err(ConsensusError::NotValidator(_))
        ));
        assert!(matches!(
            manager.report_malicious(&ctx, &mut ledger, mining("b"), 99, vec![]),
            Err(ConsensusError::ReportTooOld { block: 99, current: 200 })
        ));
        assert!(matches!(
            manager.report_malicious(&ctx, &mut ledger, mining("b"), 201, vec![]),
            Err(ConsensusError::ReportFromFuture { .. })
        ));
        manager
            .report_malicious(&ctx, &mut ledger, mining("b"), 100, vec![1])
            .unwrap();
        assert!(matches!(
            manager.report_malicious(&ctx, &mut ledger, mining("b"), 100, vec![1]),
            Err(ConsensusError::DuplicateReport { .. })
        ));
    }

    #[test]
    fn test_unremovable_is_exempt_and_cleared_once() {
        let (mut ledger, _, mut manager) = setup(&["a", "b", "c"], Some("a"));
        let auth = authority();

        let outcome = manager
            .apply_governance_ban(
                &auth
                    .authorize_governance(&CallContext::new(staking("governance"), 10))
                    .unwrap(),
                10,
                &mut ledger,
                mining("a"),
                BanReason::OftenBlockSkips,
            )
            .unwrap();
        assert_eq!(outcome, ReportOutcome::Exempt);
        assert!(manager.is_validator(&mining("a")));

        assert!(manager
            .clear_unremovable(&CallContext::new(staking("b"), 10), &auth, &mut ledger)
            .is_err());
        manager
            .clear_unremovable(&CallContext::new(staking("admin"), 10), &auth, &mut ledger)
            .unwrap();
        assert!(!ledger.pool(&staking("a")).unwrap().unremovable);
        assert!(matches!(
            manager.clear_unremovable(&CallContext::new(staking("a"), 11), &auth, &mut ledger),
            Err(ConsensusError::NoUnremovableValidator)
        ));
    }

    #[test]
    fn test_sole_validator_ejection_is_deferred() {
        let (mut ledger, mut token, mut manager) = setup(&["a"], None);
        token.mint(&staking("b"), &Amount::from_u64(5_000)).unwrap();
        ledger
            .add_pool(&CallContext::new(staking("b"), 5), &mut token, mining("b"), Amount::from_u64(1_000))
            .unwrap();
        let governance = authority()
            .authorize_governance(&CallContext::new(staking("governance"), 20))
            .unwrap();

        let outcome = manager
            .apply_governance_ban(&governance, 20, &mut ledger, mining("a"), BanReason::Unrevealed)
            .unwrap();
        assert_eq!(outcome, ReportOutcome::Deferred);
        assert_eq!(manager.current_validators(), &[mining("a")]);
        assert!(manager.is_ejection_deferred(&mining("a")));
        assert!(matches!(
            manager.apply_governance_ban(&governance, 21, &mut ledger, mining("a"), BanReason::Unrevealed),
            Err(ConsensusError::AlreadyBanned(_))
        ));

        let beacon = RandomBeacon::new(10);
        let pending = manager.rotate(&system_call(100), &mut ledger, &beacon).unwrap();
        assert_eq!(pending, vec![mining("b")]);
        assert!(ledger.is_pool_banned(&staking("a"), 100));
        assert_eq!(manager.ban_counter(&mining("a")), 1);

        manager.finalize(&system_call(101), &mut ledger).unwrap();
        assert_eq!(manager.current_validators(), &[mining("b")]);
        assert_eq!(ledger.pool(&staking("a")).unwrap().status, PoolStatus::Inactive);
    }

    #[test]
    fn test_empty_selection_keeps_current_set() {
        let (mut ledger, _, mut manager) = setup(&["a"], None);
        let governance = authority()
            .authorize_governance(&CallContext::new(staking("governance"), 20))
            .unwrap();
        manager
            .apply_governance_ban(&governance, 20, &mut ledger, mining("a"), BanReason::Malicious)
            .unwrap();

        let beacon = RandomBeacon::new(10);
        let kept = manager.rotate(&system_call(100), &mut ledger, &beacon).unwrap();
        assert_eq!(kept, vec![mining("a")]);
        assert!(!manager.is_change_pending());
        assert_eq!(manager.snapshot_pools(&ledger), vec![staking("a")]);
    }
}

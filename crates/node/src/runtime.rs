// node/src/runtime.rs
use crate::{NodeConfig, RuntimeResult};
use consensus::{BanReason, RandomBeacon, ReportOutcome, ValidatorMembership, ValidatorSetEvent, ValidatorSetManager};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use stake_ledger::{PoolStatus, StakeLedger};
use staking_core::{
    Amount, BalanceLedger, BlockNumber, CallContext, EpochNumber, StakingEpoch, StakingParams,
    SystemAuthority, SystemCall,
};
use staking_crypto::{Address, Hash};
use storage::StateStore;
use tokenomics::{RewardDistributor, SettlementReport};

/// A pool present from block zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisValidator {
    pub staking_address: Address,
    pub mining_address: Address,
    pub stake: Amount,
}

/// Everything the staking core persists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingState {
    pub authority: SystemAuthority,
    pub ledger: StakeLedger,
    pub beacon: RandomBeacon,
    pub validators: ValidatorSetManager,
    pub rewards: RewardDistributor,
    pub token: BalanceLedger,
    pub native: BalanceLedger,
}

/// What `on_block` did
#[derive(Debug, Clone, Default)]
pub struct BlockOutcome {
    pub finalized: Option<Vec<Address>>,
    pub reveal_skips: Vec<Address>,
    pub proposed: Option<Vec<Address>>,
    pub settlement: Option<SettlementReport>,
    pub new_epoch: Option<EpochNumber>,
    pub events: Vec<ValidatorSetEvent>,
    pub checkpoint: Option<BlockNumber>,
}

/// Host-facing entry point of the staking core.
///
/// Every call runs against a copy of the state that replaces the live one
/// only when the call succeeds.
pub struct StakingRuntime {
    state: StakingState,
    store: Option<StateStore>,
    checkpoint_interval: u64,
    auto_finalize: bool,
}

impl StakingRuntime {
    /// Build the genesis state: escrowed genesis pools, the initial validator
    /// set and the reward snapshot of epoch 0
    pub fn genesis(
        params: StakingParams,
        authority: SystemAuthority,
        genesis: &[GenesisValidator],
        unremovable: Option<Address>,
    ) -> RuntimeResult<Self> {
        let mut token = BalanceLedger::new();
        let mut ledger = StakeLedger::new(params.clone())?;
        for validator in genesis {
            ledger.add_genesis_pool(
                &mut token,
                validator.staking_address,
                validator.mining_address,
                validator.stake.clone(),
            )?;
        }

        let mut validators = ValidatorSetManager::new(&params);
        let mining: Vec<Address> = genesis.iter().map(|v| v.mining_address).collect();
        validators.initialize(&mut ledger, &mining, unremovable)?;

        let mut rewards = RewardDistributor::new(&params);
        let cap = authority.authorize_system(&CallContext::new(authority.system(), 0))?;
        let pools = validators.snapshot_pools(&ledger);
        rewards.take_snapshot(&cap, &ledger, 0, &pools)?;

        tracing::info!(
            validators = genesis.len(),
            epoch_duration = params.epoch_duration,
            "staking genesis built"
        );
        Ok(Self {
            state: StakingState {
                authority,
                ledger,
                beacon: RandomBeacon::new(params.collect_round_length),
                validators,
                rewards,
                token,
                native: BalanceLedger::new(),
            },
            store: None,
            checkpoint_interval: 0,
            auto_finalize: true,
        })
    }

    /// Resume from the latest checkpoint when storage holds one, otherwise
    /// build genesis from the config
    pub fn from_config(config: &NodeConfig) -> RuntimeResult<Self> {
        let store = if config.storage.enabled {
            Some(StateStore::open(config.store_config())?)
        } else {
            None
        };

        let restored = match &store {
            Some(store) => store.load_latest::<StakingState>()?,
            None => None,
        };
        let mut runtime = match restored {
            Some((block, state)) => {
                tracing::info!(block, epoch = state.ledger.epoch().number, "staking state restored");
                Self::from_state(state)
            }
            None => Self::genesis(
                config.staking_params()?,
                config.authority()?,
                &config.genesis_validators()?,
                config.unremovable()?,
            )?,
        };
        runtime.auto_finalize = config.staking.auto_finalize;
        if let Some(store) = store {
            runtime = runtime.with_store(store, config.storage.checkpoint_interval);
        }
        Ok(runtime)
    }

    pub fn from_state(state: StakingState) -> Self {
        Self {
            state,
            store: None,
            checkpoint_interval: 0,
            auto_finalize: true,
        }
    }

    /// Write a checkpoint every `interval` blocks
    pub fn with_store(mut self, store: StateStore, interval: u64) -> Self {
        self.store = Some(store);
        self.checkpoint_interval = interval;
        self
    }

    pub fn with_auto_finalize(mut self, auto_finalize: bool) -> Self {
        self.auto_finalize = auto_finalize;
        self
    }

    pub fn state(&self) -> &StakingState {
        &self.state
    }

    /// The host's token ledger
    pub fn token_mut(&mut self) -> &mut BalanceLedger {
        &mut self.state.token
    }

    /// The host's native coin balances
    pub fn native_mut(&mut self) -> &mut BalanceLedger {
        &mut self.state.native
    }

    // ==================== BLOCK PROCESSING ====================

    /// Per-block bookkeeping, invoked by the system caller for every block.
    ///
    /// A block past the end of the current epoch first closes every epoch
    /// whose last block was skipped or failed, then counts into the new one.
    pub fn on_block(&mut self, ctx: &CallContext, creator: Address) -> RuntimeResult<BlockOutcome> {
        let finalize = self.auto_finalize && self.state.validators.is_change_pending();
        let boundary = ctx.block >= self.state.ledger.epoch().end_block();

        let mut outcome = if finalize || boundary {
            self.atomically(|state| Self::process_block(state, ctx, creator, finalize))?
        } else {
            // tally is the only fallible step and it validates before writing
            let state = &mut self.state;
            let cap = state.authority.authorize_system(ctx)?;
            state.rewards.tally(&cap, &state.ledger, &creator)?;
            let epoch = state.ledger.epoch().number;
            BlockOutcome {
                reveal_skips: state
                    .beacon
                    .on_finish_collect_round(&cap, state.validators.current_validators(), epoch),
                events: state.validators.drain_events(),
                ..Default::default()
            }
        };

        outcome.checkpoint = self.maybe_checkpoint(ctx.block);
        Ok(outcome)
    }

    fn process_block(
        state: &mut StakingState,
        ctx: &CallContext,
        creator: Address,
        finalize: bool,
    ) -> RuntimeResult<BlockOutcome> {
        let cap = state.authority.authorize_system(ctx)?;
        let mut outcome = BlockOutcome::default();

        if finalize {
            outcome.finalized = Some(state.validators.finalize(&cap, &mut state.ledger)?);
        }

        while cap.block() > state.ledger.epoch().end_block() {
            let missed = *state.ledger.epoch();
            tracing::warn!(
                epoch = missed.number,
                end_block = missed.end_block(),
                block = cap.block(),
                "closing epoch whose last block was not processed"
            );
            Self::close_epoch(state, &cap, &missed, &mut outcome)?;
        }

        state.rewards.tally(&cap, &state.ledger, &creator)?;
        let epoch = *state.ledger.epoch();
        outcome.reveal_skips =
            state
                .beacon
                .on_finish_collect_round(&cap, state.validators.current_validators(), epoch.number);

        if epoch.is_last_block(cap.block()) {
            Self::close_epoch(state, &cap, &epoch, &mut outcome)?;
        }

        outcome.events = state.validators.drain_events();
        Ok(outcome)
    }

    /// rotate, settle `epoch`, then start the next epoch right after it
    fn close_epoch(
        state: &mut StakingState,
        cap: &SystemCall,
        epoch: &StakingEpoch,
        outcome: &mut BlockOutcome,
    ) -> RuntimeResult<()> {
        outcome.proposed = Some(state.validators.rotate(cap, &mut state.ledger, &state.beacon)?);
        let next_pools = state.validators.snapshot_pools(&state.ledger);
        outcome.settlement = Some(state.rewards.settle(
            cap,
            &mut state.token,
            &state.ledger,
            epoch,
            &next_pools,
        )?);
        let next = state.ledger.increment_epoch(cap, epoch.end_block() + 1)?;
        outcome.new_epoch = Some(next.number);
        Ok(())
    }

    /// Make the proposed validator set current
    pub fn finalize_change(&mut self, ctx: &CallContext) -> RuntimeResult<Vec<Address>> {
        self.atomically(|state| {
            let cap = state.authority.authorize_system(ctx)?;
            Ok(state.validators.finalize(&cap, &mut state.ledger)?)
        })
    }

    // ==================== STAKING ====================

    pub fn add_pool(&mut self, ctx: &CallContext, mining: Address, own_stake: Amount) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.ledger.add_pool(ctx, &mut state.token, mining, own_stake)?))
    }

    pub fn stake(&mut self, ctx: &CallContext, pool: &Address, amount: Amount) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.ledger.stake(ctx, &mut state.token, pool, amount)?))
    }

    pub fn withdraw(&mut self, ctx: &CallContext, pool: &Address, amount: Amount) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.ledger.withdraw(ctx, &mut state.token, pool, amount)?))
    }

    pub fn order_withdrawal(&mut self, ctx: &CallContext, pool: &Address, delta: &BigInt) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.ledger.order_withdrawal(ctx, pool, delta)?))
    }

    pub fn claim_ordered_withdrawal(&mut self, ctx: &CallContext, pool: &Address) -> RuntimeResult<Amount> {
        self.atomically(|state| Ok(state.ledger.claim_ordered_withdrawal(ctx, &mut state.token, pool)?))
    }

    pub fn remove_my_pool(&mut self, ctx: &CallContext) -> RuntimeResult<PoolStatus> {
        self.atomically(|state| Ok(state.ledger.remove_my_pool(ctx)?))
    }

    pub fn remove_pool(&mut self, ctx: &CallContext, pool: &Address) -> RuntimeResult<PoolStatus> {
        self.atomically(|state| {
            let cap = state.authority.authorize_system(ctx)?;
            Ok(state.ledger.remove_pool(&cap, pool)?)
        })
    }

    // ==================== RANDOMNESS ====================

    pub fn commit_hash(&mut self, ctx: &CallContext, hash: Hash, cipher: Vec<u8>) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.beacon.commit_hash(ctx, &state.validators, hash, cipher)?))
    }

    pub fn reveal_number(&mut self, ctx: &CallContext, number: Hash) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.beacon.reveal_number(ctx, &state.validators, number)?))
    }

    // ==================== VALIDATOR SET ====================

    pub fn report_malicious(
        &mut self,
        ctx: &CallContext,
        accused: Address,
        block_number: BlockNumber,
        proof: Vec<u8>,
    ) -> RuntimeResult<ReportOutcome> {
        self.atomically(|state| {
            Ok(state
                .validators
                .report_malicious(ctx, &mut state.ledger, accused, block_number, proof)?)
        })
    }

    pub fn apply_governance_ban(
        &mut self,
        ctx: &CallContext,
        mining: Address,
        reason: BanReason,
    ) -> RuntimeResult<ReportOutcome> {
        self.atomically(|state| {
            let cap = state.authority.authorize_governance(ctx)?;
            Ok(state
                .validators
                .apply_governance_ban(&cap, ctx.block, &mut state.ledger, mining, reason)?)
        })
    }

    pub fn clear_unremovable(&mut self, ctx: &CallContext) -> RuntimeResult<()> {
        self.atomically(|state| {
            Ok(state
                .validators
                .clear_unremovable(ctx, &state.authority, &mut state.ledger)?)
        })
    }

    // ==================== REWARDS ====================

    pub fn add_bridge_token_fee(&mut self, ctx: &CallContext, amount: Amount) -> RuntimeResult<()> {
        self.atomically(|state| {
            let cap = state.authority.authorize_bridge(ctx)?;
            Ok(state.rewards.add_bridge_token_fee(&cap, &mut state.token, amount)?)
        })
    }

    pub fn add_bridge_native_fee(&mut self, ctx: &CallContext, amount: Amount) -> RuntimeResult<()> {
        self.atomically(|state| {
            let cap = state.authority.authorize_bridge(ctx)?;
            Ok(state.rewards.add_bridge_native_fee(&cap, &mut state.native, amount)?)
        })
    }

    /// Returns the `(token, native)` amounts paid
    pub fn claim_reward(
        &mut self,
        ctx: &CallContext,
        epochs: &[EpochNumber],
        pool: &Address,
    ) -> RuntimeResult<(Amount, Amount)> {
        self.atomically(|state| {
            Ok(state
                .rewards
                .claim_reward(ctx, &mut state.token, &mut state.native, epochs, pool)?)
        })
    }

    // ==================== AUTHORITY ====================

    pub fn set_system(&mut self, ctx: &CallContext, system: Address) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.authority.set_system(ctx, system)?))
    }

    pub fn set_bridge(&mut self, ctx: &CallContext, bridge: Address) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.authority.set_bridge(ctx, bridge)?))
    }

    pub fn set_governance(&mut self, ctx: &CallContext, governance: Address) -> RuntimeResult<()> {
        self.atomically(|state| Ok(state.authority.set_governance(ctx, governance)?))
    }

    fn atomically<T>(
        &mut self,
        call: impl FnOnce(&mut StakingState) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        let mut draft = self.state.clone();
        let value = call(&mut draft)?;
        self.state = draft;
        Ok(value)
    }

    /// A failed write is logged; block processing already committed
    fn maybe_checkpoint(&self, block: BlockNumber) -> Option<BlockNumber> {
        let store = self.store.as_ref()?;
        if self.checkpoint_interval == 0 || block % self.checkpoint_interval != 0 {
            return None;
        }
        match store.save_checkpoint(block, self.state.ledger.epoch().number, &self.state) {
            Ok(_) => Some(block),
            Err(e) => {
                tracing::error!(block, error = %e, "checkpoint write failed");
                None
            }
        }
    }
}

// ledger/src/lib.rs

//! Pool and delegator stake bookkeeping
//!
//! This crate provides:
//! - Pool registration, staking and the two withdrawal paths (instant and ordered)
//! - Per-epoch delegator stake history used by reward settlement
//! - The electable pool list and stake likelihoods consumed by selection

pub mod ledger;
pub mod pool;

pub use ledger::{Likelihood, StakeLedger, StakeReader};
pub use pool::{DelegatorStake, EpochStake, Pool, PoolStatus, WithdrawalOrder};

use staking_core::{Amount, BlockNumber, CoreError, EpochNumber, TokenError};
use staking_crypto::Address;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in the stake ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Zero address")]
    ZeroAddress,

    #[error("Zero amount")]
    ZeroAmount,

    #[error("Address {0} is already bound to a pool")]
    IdentityInUse(Address),

    #[error("Pool already exists: {0}")]
    PoolAlreadyExists(Address),

    #[error("Pool not found: {0}")]
    PoolNotFound(Address),

    #[error("Pool limit reached: {max}")]
    TooManyPools { max: usize },

    #[error("Delegator limit of pool {pool} reached: {max}")]
    TooManyDelegators { pool: Address, max: usize },

    #[error("Insufficient stake: required {required}, provided {provided}")]
    InsufficientStake { required: Amount, provided: Amount },

    #[error("Withdrawal exceeds available stake: available {available}, requested {requested}")]
    WithdrawalExceedsAvailable { available: Amount, requested: Amount },

    #[error("Withdrawal exceeds ordered stake: ordered {ordered}, requested {requested}")]
    WithdrawalExceedsOrdered { ordered: Amount, requested: Amount },

    #[error("No withdrawal order of {staker} in pool {pool}")]
    NoWithdrawalOrder { pool: Address, staker: Address },

    #[error("Withdrawal ordered in epoch {order_epoch} is not claimable in epoch {current_epoch}")]
    OrderNotClaimable {
        order_epoch: EpochNumber,
        current_epoch: EpochNumber,
    },

    #[error("Block {block} is outside the staking window (last allowed block {last_allowed})")]
    OutsideStakingWindow {
        block: BlockNumber,
        last_allowed: BlockNumber,
    },

    #[error("Pool {pool} is banned until block {until}")]
    PoolBanned { pool: Address, until: BlockNumber },

    #[error("Delegators of pool {pool} are banned until block {until}")]
    DelegatorsBanned { pool: Address, until: BlockNumber },

    #[error("Pool is inactive: {0}")]
    PoolInactive(Address),

    #[error("Pool is not a current or pending validator: {0}")]
    NotValidatorPool(Address),

    #[error("Pool is unremovable: {0}")]
    UnremovablePool(Address),

    #[error("Genesis pools can only be added before the first epoch transition")]
    GenesisClosed,

    #[error("Invalid epoch transition: expected start block {expected}, got {got}")]
    InvalidEpochTransition {
        expected: BlockNumber,
        got: BlockNumber,
    },

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientStake {
            required: Amount::from_u64(10),
            provided: Amount::from_u64(9),
        };
        assert_eq!(err.to_string(), "Insufficient stake: required 10, provided 9");
    }
}

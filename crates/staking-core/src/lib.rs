// staking-core/src/lib.rs

//! Shared vocabulary of the staking core
//!
//! This crate provides:
//! - Amount and block/epoch/round number types
//! - The staking epoch clock
//! - Protocol parameters and their validation
//! - The privileged-caller capabilities
//! - The token collaborator interface and an in-memory balance ledger

pub mod authority;
pub mod epoch;
pub mod params;
pub mod token;
pub mod types;

pub use authority::{BridgeCall, CallContext, GovernanceCall, SystemAuthority, SystemCall};
pub use epoch::StakingEpoch;
pub use params::{StakingParams, ValidatorRewardCurve};
pub use token::{BalanceLedger, TokenError, TokenLedger, REWARD_ACCOUNT, STAKING_ACCOUNT};
pub use types::*;

use staking_crypto::Address;

/// Result type for shared core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the shared core layer
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unauthorized: {caller} is not the {role} caller")]
    Unauthorized { caller: Address, role: &'static str },

    #[error("Zero address")]
    ZeroAddress,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] staking_crypto::CryptoError),
}

// consensus/src/lib.rs

//! Validator rotation for the staking core
//!
//! This crate implements:
//! - A commit-reveal random beacon run by the current validators
//! - Stake-weighted sampling of the next validator set
//! - The propose/finalize validator-set transition protocol
//! - Malicious-validator reports, quorum ejection and bans

pub mod beacon;
pub mod reporting;
pub mod selection;
pub mod validator_set;

pub use beacon::{BeaconPhase, Commitment, RandomBeacon};
pub use reporting::{BanReason, BanRecord, MaliceReport, ReportBook};
pub use selection::ValidatorSelector;
pub use validator_set::{ReportOutcome, ValidatorMembership, ValidatorSetEvent, ValidatorSetManager};

use stake_ledger::LedgerError;
use staking_core::{BlockNumber, CoreError, RoundNumber};
use staking_crypto::Address;

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Errors that can occur during consensus operations
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Not a current validator: {0}")]
    NotValidator(Address),

    #[error("Block {0} is not in a commit phase")]
    NotCommitPhase(BlockNumber),

    #[error("Block {0} is not in a reveal phase")]
    NotRevealPhase(BlockNumber),

    #[error("Zero commitment")]
    ZeroCommitment,

    #[error("{validator} already committed in round {round}")]
    AlreadyCommitted { validator: Address, round: RoundNumber },

    #[error("{validator} has no commitment in round {round}")]
    NoCommitment { validator: Address, round: RoundNumber },

    #[error("{validator} already revealed in round {round}")]
    AlreadyRevealed { validator: Address, round: RoundNumber },

    #[error("Revealed number does not match the commitment of {0}")]
    CommitmentMismatch(Address),

    #[error("Selection drew {0} twice")]
    DuplicateDraw(Address),

    #[error("Validator set already initialized")]
    AlreadyInitialized,

    #[error("Validator set not initialized")]
    NotInitialized,

    #[error("Validator set would be empty")]
    EmptyValidatorSet,

    #[error("Unknown validator: {0}")]
    UnknownValidator(Address),

    #[error("No validator set change is pending")]
    NoPendingChange,

    #[error("Validator cannot report itself")]
    SelfReport,

    #[error("Reporter {0} is banned")]
    ReporterBanned(Address),

    #[error("Validator already banned: {0}")]
    AlreadyBanned(Address),

    #[error("Report for block {block} is too old at block {current}")]
    ReportTooOld { block: BlockNumber, current: BlockNumber },

    #[error("Report for future block {block} at block {current}")]
    ReportFromFuture { block: BlockNumber, current: BlockNumber },

    #[error("{reporter} already reported {accused} for block {block}")]
    DuplicateReport {
        reporter: Address,
        accused: Address,
        block: BlockNumber,
    },

    #[error("No unremovable validator is set")]
    NoUnremovableValidator,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] staking_crypto::CryptoError),
}

// staking-crypto/src/lib.rs

//! Cryptographic primitives for the staking core
//!
//! This crate provides:
//! - 32-byte hashes (SHA256 and Keccak256)
//! - Stable 20-byte identities for staking and mining addresses
//! - The commit digest used by the random beacon
//! - The per-iteration draw value used by validator selection

pub mod address;
pub mod hash;

pub use address::Address;
pub use hash::{commitment_digest, draw_value, Hash, HashAlgorithm, Hashable, HASH_SIZE};

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid hash")]
    InvalidHash,

    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidAddressLength(usize),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

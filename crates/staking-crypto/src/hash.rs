// staking-crypto/src/hash.rs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::fmt;
use std::ops::BitXor;

/// Hash output size in bytes
pub const HASH_SIZE: usize = 32;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    Keccak256,
}

/// A 32-byte hash value.
///
/// Also used as the 256-bit secret a validator reveals to the beacon and as
/// the beacon's combined seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a new hash from bytes
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a hash from a slice (returns error if wrong length)
    pub fn from_slice(slice: &[u8]) -> Result<Self, crate::CryptoError> {
        if slice.len() != HASH_SIZE {
            return Err(crate::CryptoError::InvalidHash);
        }
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Big-endian 256-bit value with `value` in the low 8 bytes
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        bytes[HASH_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the hash as a fixed-size array
    pub fn to_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, crate::CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| crate::CryptoError::DeserializationError(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl BitXor for Hash {
    type Output = Hash;

    fn bitxor(self, other: Hash) -> Hash {
        let mut out = [0u8; HASH_SIZE];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        Hash(out)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}...{})",
               hex::encode(&self.0[..4]),
               hex::encode(&self.0[28..]))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// Trait for types that can be hashed
pub trait Hashable {
    fn hash(&self) -> Hash;
    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash;
}

impl Hashable for [u8] {
    fn hash(&self) -> Hash {
        self.hash_with(HashAlgorithm::Sha256)
    }

    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        match algorithm {
            HashAlgorithm::Sha256 => Hash::new(Sha256::digest(self).into()),
            HashAlgorithm::Keccak256 => Hash::new(Keccak256::digest(self).into()),
        }
    }
}

/// Digest a validator publishes in the commit phase for a secret `number`.
pub fn commitment_digest(number: &Hash) -> Hash {
    number.as_bytes().hash_with(HashAlgorithm::Keccak256)
}

/// Pseudo-random value for draw `iteration` of a selection seeded by `seed`.
///
/// `sha256(seed || iteration_be)`; the selector reduces it modulo the live
/// likelihood sum.
pub fn draw_value(seed: &Hash, iteration: u64) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(iteration.to_be_bytes());
    Hash::new(hasher.finalize().into())
}

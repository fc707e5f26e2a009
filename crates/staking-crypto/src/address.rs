// staking-crypto/src/address.rs

use crate::{hash::Hashable, CryptoError, CryptoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable 20-byte identity.
///
/// Used for staking addresses (pool ids), mining addresses (validator keys)
/// and the privileged callers alike.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct Address([u8; 20]);

impl Address {
    /// Create address from bytes
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive an address from arbitrary seed bytes (last 20 bytes of sha256)
    pub fn derive(seed: &[u8]) -> Self {
        let hash = seed.hash();
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash.as_bytes()[12..32]);
        Self(address)
    }

    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != 20 {
            return Err(CryptoError::InvalidAddressLength(slice.len()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(slice);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| CryptoError::DeserializationError(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn zero() -> Self {
        Self([0u8; 20])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex() {
        let address = Address::derive(b"pool-1");
        let parsed = Address::from_hex(&address.to_hex()).unwrap();
        assert_eq!(address, parsed);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!(matches!(
            Address::from_hex("0x1234"),
            Err(CryptoError::InvalidAddressLength(2))
        ));
    }

    #[test]
    fn test_derive_is_stable() {
        assert_eq!(Address::derive(b"a"), Address::derive(b"a"));
        assert_ne!(Address::derive(b"a"), Address::derive(b"b"));
        assert!(!Address::derive(b"a").is_zero());
        assert!(Address::zero().is_zero());
    }
}

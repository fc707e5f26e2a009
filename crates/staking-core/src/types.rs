// staking-core/src/types.rs

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Block number/height
pub type BlockNumber = u64;

/// Staking epoch number (the genesis epoch is 0)
pub type EpochNumber = u64;

/// Random beacon collection round number
pub type RoundNumber = u64;

/// Token amount (using BigUint for arbitrary precision)
///
/// Reward math multiplies amounts by stakes before dividing, so products
/// never fit a fixed-width integer for realistic 18-decimal balances.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(BigUint);

impl Amount {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    pub fn from_tokens(tokens: u64) -> Self {
        // 1 token = 10^18 base units
        Self(BigUint::from(tokens) * BigUint::from(10u64).pow(18))
    }

    pub fn inner(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Lossy view for logs; saturates at `u128::MAX`
    pub fn to_u128_saturating(&self) -> u128 {
        self.0.to_u128().unwrap_or(u128::MAX)
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        Some(Amount(&self.0 + &other.0))
    }

    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or_else(Amount::zero)
    }

    /// `self * numerator / denominator`, truncating. `None` when the
    /// denominator is zero.
    pub fn mul_div(&self, numerator: &BigUint, denominator: &BigUint) -> Option<Amount> {
        if denominator.is_zero() {
            return None;
        }
        Some(Amount(&self.0 * numerator / denominator))
    }

    pub fn mul_u64(&self, factor: u64) -> Amount {
        Amount(&self.0 * factor)
    }

    pub fn div_u64(&self, divisor: u64) -> Option<Amount> {
        if divisor == 0 {
            return None;
        }
        Some(Amount(&self.0 / divisor))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, other: &'a Amount) -> Amount {
        Amount(&self.0 + &other.0)
    }
}

/// Panics on underflow like the integer operators; callers use
/// `checked_sub` wherever the ordering is not already established.
impl Sub for Amount {
    type Output = Amount;

    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, a| &acc + a)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::from_u64(value)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Staked token amount
pub type StakeAmount = Amount;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::from_u64(100);
        let b = Amount::from_u64(50);

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum, Amount::from_u64(150));

        let diff = sum.checked_sub(&b).unwrap();
        assert_eq!(diff, Amount::from_u64(100));
    }

    #[test]
    fn test_amount_underflow() {
        let a = Amount::from_u64(50);
        let b = Amount::from_u64(100);

        assert!(a.checked_sub(&b).is_none());
        assert_eq!(a.saturating_sub(&b), Amount::zero());
    }

    #[test]
    fn test_mul_div_truncates() {
        let reward = Amount::from_u64(10);
        let share = reward
            .mul_div(&BigUint::from(1u64), &BigUint::from(3u64))
            .unwrap();
        assert_eq!(share, Amount::from_u64(3));
        assert!(reward.mul_div(&BigUint::from(1u64), &BigUint::zero()).is_none());
    }

    #[test]
    fn test_mul_div_exceeds_u128() {
        let big = Amount::from_tokens(10_000_000_000);
        let product = big.mul_div(big.inner(), &BigUint::from(1u64)).unwrap();
        assert_eq!(product.to_u128_saturating(), u128::MAX);
        assert_eq!(product.div_u64(1).unwrap(), product);
    }

    proptest::proptest! {
        #[test]
        fn prop_share_never_exceeds_whole(whole in 0u64..u64::MAX, num in 0u64..1_000_000, extra in 0u64..1_000_000) {
            let den = num + extra + 1;
            let share = Amount::from_u64(whole)
                .mul_div(&BigUint::from(num), &BigUint::from(den))
                .unwrap();
            proptest::prop_assert!(share <= Amount::from_u64(whole));
        }
    }

    #[test]
    fn test_sum() {
        let total: Amount = [1u64, 2, 3].iter().map(|v| Amount::from_u64(*v)).sum();
        assert_eq!(total, Amount::from_u64(6));
    }
}

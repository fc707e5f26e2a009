// staking-core/src/token.rs

//! Balance-ledger view of the bridged staking token (and of the native coin).
//!
//! The core never implements token logic; it only moves balances through
//! [`TokenLedger`]. [`BalanceLedger`] is the in-memory implementation the
//! runtime and the tests use.

use crate::types::Amount;
use serde::{Deserialize, Serialize};
use staking_crypto::Address;
use std::collections::BTreeMap;

/// Account holding every escrowed stake
pub const STAKING_ACCOUNT: Address = Address::new([0x5a; 20]);

/// Account holding distributable and undistributed rewards
pub const REWARD_ACCOUNT: Address = Address::new([0x7e; 20]);

/// Errors raised by a token collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Insufficient balance: {account} holds {available}, needs {required}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Transfer to the zero address")]
    ZeroRecipient,
}

/// Mint/transfer/balance semantics of the token collaborator
pub trait TokenLedger {
    fn balance_of(&self, account: &Address) -> Amount;

    fn transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> Result<(), TokenError>;

    fn mint(&mut self, to: &Address, amount: &Amount) -> Result<(), TokenError>;
}

/// In-memory balance ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedger {
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> &Amount {
        &self.total_supply
    }

    /// Accounts with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter().filter(|(_, amount)| !amount.is_zero())
    }
}

impl TokenLedger for BalanceLedger {
    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).cloned().unwrap_or_else(Amount::zero)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }
        let available = self.balance_of(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientBalance {
                account: *from,
                available: available.clone(),
                required: amount.clone(),
            })?;

        self.balances.insert(*from, remaining);
        let credited = &self.balance_of(to) + amount;
        self.balances.insert(*to, credited);
        Ok(())
    }

    fn mint(&mut self, to: &Address, amount: &Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroRecipient);
        }
        let credited = &self.balance_of(to) + amount;
        self.balances.insert(*to, credited);
        self.total_supply = &self.total_supply + amount;
        Ok(())
    }
}

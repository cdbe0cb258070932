//! Opaque fungible value used by stake operations.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A quantity of fungible value.
///
/// Value only moves by splitting and joining coins, so the total amount in
/// circulation is conserved by construction.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    value: u64,
}

impl Coin {
    /// Create value out of nothing. Only the execution host should call this.
    pub fn mint(value: u64) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self { value: 0 }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Take `amount` out of this coin into a new one.
    pub fn split(&mut self, amount: u64) -> Result<Coin, LedgerError> {
        if amount > self.value {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.value,
            });
        }
        self.value -= amount;
        Ok(Coin { value: amount })
    }

    /// Merge `other` into this coin. Fails without touching `self` if the
    /// sum does not fit in a `u64`.
    pub fn join(&mut self, other: Coin) -> Result<(), LedgerError> {
        self.value = self
            .value
            .checked_add(other.value)
            .ok_or(LedgerError::ValueOverflow {
                value: self.value,
                amount: other.value,
            })?;
        Ok(())
    }

    pub fn into_value(self) -> u64 {
        self.value
    }
}

impl Default for Coin {
    fn default() -> Self {
        Self::zero()
    }
}

//! # Phantom-Typed Balances
//!
//! Custody of a fungible amount tagged with its asset at the type level.
//!
//! A `Balance<A>` is deliberately neither `Clone` nor `Copy`: an amount held
//! in custody can be split, joined or withdrawn, but never duplicated.

use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Marker trait for asset types.
///
/// Implementors are zero-sized markers, e.g. `struct Usdc;`.
pub trait Asset: Send + Sync + 'static {
    /// Ticker used in logs.
    const SYMBOL: &'static str;
}

/// Balance operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// Split amount exceeds the held value.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    Insufficient { requested: u64, available: u64 },

    /// Join would overflow u64.
    #[error("Balance overflow joining {left} and {right}")]
    Overflow { left: u64, right: u64 },

    /// Attempted to destroy a non-zero balance.
    #[error("Cannot destroy non-zero balance of {value}")]
    NonZero { value: u64 },
}

/// An amount of asset `A` held in custody.
pub struct Balance<A: Asset> {
    value: u64,
    _asset: PhantomData<A>,
}

impl<A: Asset> Balance<A> {
    /// An empty balance.
    pub fn zero() -> Self {
        Self {
            value: 0,
            _asset: PhantomData,
        }
    }

    /// Takes `value` into custody at the host boundary (deposit).
    pub fn deposit(value: u64) -> Self {
        Self {
            value,
            _asset: PhantomData,
        }
    }

    /// Held amount.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Merges another balance of the same asset into this one.
    pub fn join(&mut self, other: Balance<A>) -> Result<u64, BalanceError> {
        let joined = self
            .value
            .checked_add(other.value)
            .ok_or(BalanceError::Overflow {
                left: self.value,
                right: other.value,
            })?;
        self.value = joined;
        Ok(joined)
    }

    /// Splits `amount` off into a new balance.
    pub fn split(&mut self, amount: u64) -> Result<Balance<A>, BalanceError> {
        if amount > self.value {
            return Err(BalanceError::Insufficient {
                requested: amount,
                available: self.value,
            });
        }
        self.value -= amount;
        Ok(Balance::deposit(amount))
    }

    /// Releases the balance from custody, returning the amount (withdrawal or burn).
    pub fn withdraw_all(self) -> u64 {
        self.value
    }

    /// Destroys an empty balance.
    pub fn destroy_zero(self) -> Result<(), BalanceError> {
        if self.value != 0 {
            return Err(BalanceError::NonZero { value: self.value });
        }
        Ok(())
    }
}

impl<A: Asset> fmt::Debug for Balance<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Balance<{}>({})", A::SYMBOL, self.value)
    }
}

impl<A: Asset> PartialEq for Balance<A> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<A: Asset> Eq for Balance<A> {}

impl<A: Asset> Default for Balance<A> {
    fn default() -> Self {
        Self::zero()
    }
}

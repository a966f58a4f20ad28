//! Admission control resources.
//!
//! Activation and completion happen in separate operations, so neither
//! resource hands out RAII permits. A slot is acquired by activation and
//! given back by an explicit `release`, which fails rather than underflow.

use crate::domain::errors::{QueueError, QueueResult};
use shared_types::ProposalId;

/// Counting semaphore over the concurrently active proposals of a DAO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencySlots {
    capacity: u64,
    in_use: u64,
}

impl ConcurrencySlots {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            in_use: 0,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn in_use(&self) -> u64 {
        self.in_use
    }

    pub fn available(&self) -> u64 {
        self.capacity.saturating_sub(self.in_use)
    }

    pub fn is_full(&self) -> bool {
        self.in_use >= self.capacity
    }

    /// Take one slot. Returns `false` if none is free.
    #[must_use]
    pub fn try_acquire(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.in_use += 1;
        true
    }

    pub fn ensure_can_release(&self) -> QueueResult<()> {
        if self.in_use == 0 {
            return Err(QueueError::ActiveCountUnderflow);
        }
        Ok(())
    }

    /// Give one slot back.
    pub fn release(&mut self) -> QueueResult<()> {
        self.ensure_can_release()?;
        self.in_use -= 1;
        Ok(())
    }
}

/// Single-slot exclusive resource for the DAO's own liquidity.
///
/// Occupied iff exactly one DAO-funded proposal is active. The holder's id is
/// kept so operators can see which proposal owns the DAO's liquidity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaoLiquiditySlot {
    holder: Option<ProposalId>,
}

impl DaoLiquiditySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self) -> bool {
        self.holder.is_some()
    }

    pub fn holder(&self) -> Option<ProposalId> {
        self.holder
    }

    /// Claim the slot for `proposal_id`. Returns `false` if already held.
    #[must_use]
    pub fn try_acquire(&mut self, proposal_id: ProposalId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(proposal_id);
        true
    }

    pub fn ensure_can_release(&self) -> QueueResult<()> {
        if self.holder.is_none() {
            return Err(QueueError::DaoSlotNotOccupied);
        }
        Ok(())
    }

    /// Free the slot, returning the former holder.
    pub fn release(&mut self) -> QueueResult<ProposalId> {
        self.holder.take().ok_or(QueueError::DaoSlotNotOccupied)
    }
}

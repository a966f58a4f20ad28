//! # Pending Obligation Ledger
//!
//! Committed obligations waiting for an out-of-band payer. A record stays in
//! the ledger until the payer acknowledges it, so a payer that fails between
//! paying and acknowledging pays again on its next pass. Payers must be
//! idempotent on [`LedgerRecord::record_id`].

use parking_lot::Mutex;
use shared_types::{ProposalId, ShortId};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// An obligation that can sit in a [`Ledger`].
pub trait LedgerRecord: Clone + Send + Sync {
    /// Short name used in logs.
    const KIND: &'static str;

    fn record_id(&self) -> Uuid;

    fn proposal_id(&self) -> ProposalId;

    /// Value moved when the record is paid.
    fn amount(&self) -> u64;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Record {0} not found in ledger")]
    NotFound(Uuid),
}

#[derive(Debug)]
struct LedgerEntry<T> {
    record: T,
    attempts: u32,
}

/// Unacknowledged records in insertion order.
#[derive(Debug)]
pub struct Ledger<T> {
    entries: Mutex<Vec<LedgerEntry<T>>>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: LedgerRecord> Ledger<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: T) {
        info!(
            kind = T::KIND,
            record_id = %record.record_id(),
            proposal = %ShortId::of(&record.proposal_id()),
            amount = record.amount(),
            "Ledger record added"
        );
        self.entries.lock().push(LedgerEntry { record, attempts: 0 });
    }

    /// Snapshot of unacknowledged records, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<T> {
        self.entries.lock().iter().map(|e| e.record.clone()).collect()
    }

    /// Remove a paid record.
    pub fn ack(&self, id: Uuid) -> Result<T, LedgerError> {
        let mut entries = self.entries.lock();
        let pos = entries
            .iter()
            .position(|e| e.record.record_id() == id)
            .ok_or(LedgerError::NotFound(id))?;
        Ok(entries.remove(pos).record)
    }

    /// Count a failed payment attempt. Returns the attempts so far.
    pub fn record_failure(&self, id: Uuid) -> Result<u32, LedgerError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .iter_mut()
            .find(|e| e.record.record_id() == id)
            .ok_or(LedgerError::NotFound(id))?;
        entry.attempts = entry.attempts.saturating_add(1);
        Ok(entry.attempts)
    }

    #[must_use]
    pub fn attempts(&self, id: Uuid) -> Option<u32> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.record.record_id() == id)
            .map(|e| e.attempts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Outcome of one drain pass over a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub paid: usize,
    pub failed: usize,
}

//! # Transactional Outbox
//!
//! Per-operation staging area for events, refund records and settlement
//! orders. Nothing staged here is visible to anyone until [`Outbox::commit`]
//! runs.

use crate::events::GovernanceEvent;
use crate::publisher::EventPublisher;
use crate::refunds::{RefundLedger, RefundOwed};
use crate::settlement::{SettlementLedger, SettlementOrder};
use tracing::debug;

/// Position in an outbox, used to undo the effects of a failed sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboxMark {
    events: usize,
    refunds: usize,
    settlements: usize,
}

/// Result of committing an outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub events_published: usize,
    pub refunds_recorded: usize,
    pub settlements_recorded: usize,
}

/// Staged effects of one governance operation.
#[derive(Debug, Default)]
#[must_use = "staged effects are lost unless the outbox is committed"]
pub struct Outbox {
    events: Vec<GovernanceEvent>,
    refunds: Vec<RefundOwed>,
    settlements: Vec<SettlementOrder>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an event.
    pub fn emit(&mut self, event: GovernanceEvent) {
        self.events.push(event);
    }

    /// Stage a refund-owed record.
    pub fn owe_refund(&mut self, refund: RefundOwed) {
        self.refunds.push(refund);
    }

    /// Stage a settlement order.
    pub fn order_settlement(&mut self, order: SettlementOrder) {
        self.settlements.push(order);
    }

    #[must_use]
    pub fn events(&self) -> &[GovernanceEvent] {
        &self.events
    }

    #[must_use]
    pub fn refunds(&self) -> &[RefundOwed] {
        &self.refunds
    }

    #[must_use]
    pub fn settlements(&self) -> &[SettlementOrder] {
        &self.settlements
    }

    /// Total number of staged items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len() + self.refunds.len() + self.settlements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.refunds.is_empty() && self.settlements.is_empty()
    }

    /// Current position, to be passed to [`Outbox::rollback_to`].
    #[must_use]
    pub fn mark(&self) -> OutboxMark {
        OutboxMark {
            events: self.events.len(),
            refunds: self.refunds.len(),
            settlements: self.settlements.len(),
        }
    }

    /// Drop everything staged after `mark`.
    pub fn rollback_to(&mut self, mark: OutboxMark) {
        self.events.truncate(mark.events);
        self.refunds.truncate(mark.refunds);
        self.settlements.truncate(mark.settlements);
    }

    /// Publish staged events in order, then record staged refunds and
    /// settlement orders in their ledgers.
    pub fn commit(
        self,
        publisher: &dyn EventPublisher,
        refunds: &RefundLedger,
        settlements: &SettlementLedger,
    ) -> CommitReceipt {
        let receipt = CommitReceipt {
            events_published: self.events.len(),
            refunds_recorded: self.refunds.len(),
            settlements_recorded: self.settlements.len(),
        };

        for event in self.events {
            publisher.publish(event);
        }
        for refund in self.refunds {
            refunds.record(refund);
        }
        for order in self.settlements {
            settlements.record(order);
        }

        debug!(
            events = receipt.events_published,
            refunds = receipt.refunds_recorded,
            settlements = receipt.settlements_recorded,
            "Outbox committed"
        );
        receipt
    }

    /// Abandon everything staged. Used when the enclosing operation failed.
    pub fn discard(self) {
        debug!(staged = self.len(), "Outbox discarded");
    }
}

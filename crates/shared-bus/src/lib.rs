//! # Shared Bus - Governance Event Delivery
//!
//! Carries the effects of governance operations to off-chain consumers.
//!
//! ## Delivery Rules
//!
//! - Operations never publish directly. They stage events, refund records
//!   and settlement orders in an [`Outbox`] owned by the caller.
//! - The caller commits the outbox only after the operation returned `Ok`, so
//!   an aborted operation emits nothing (at-most-once per commit).
//! - Refund records land in the [`RefundLedger`] and are paid by a
//!   [`RefundWorker`] that acknowledges each record only after the payment
//!   handler succeeds (at-least-once).
//! - Settlement orders land in the [`SettlementLedger`] and are carried out
//!   one by one by the lifecycle crate's executor, with the same
//!   acknowledge-after-success rule.
//!
//! ```text
//! ┌──────────────┐  emit()   ┌──────────┐  commit()  ┌────────────────┐
//! │  Operation   │ ────────→ │  Outbox  │ ─────────→ │ InMemoryEventBus│ ──→ subscribers
//! └──────────────┘           └──────────┘     │      └────────────────┘
//!                                             ├────→ RefundLedger ──→ RefundWorker
//!                                             └────→ SettlementLedger ──→ SettlementExecutor
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod ledger;
pub mod outbox;
pub mod publisher;
pub mod refunds;
pub mod settlement;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, GovernanceEvent};
pub use ledger::{DrainReport, Ledger, LedgerError, LedgerRecord};
pub use outbox::{CommitReceipt, Outbox, OutboxMark};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use refunds::{
    RefundError, RefundHandler, RefundLedger, RefundOwed, RefundReason, RefundWorker,
};
pub use settlement::{Settlement, SettlementLedger, SettlementOrder};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

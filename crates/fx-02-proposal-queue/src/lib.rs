//! # Proposal Queue
//!
//! Per-DAO admission control for futarchy proposals. Decides which proposals
//! may enter active trading and in what order.
//!
//! ## Purpose
//!
//! A proposer submits proposal data plus a fee. The queue then either:
//!
//! - admits it immediately (queue empty and a slot is free),
//! - enqueues it, possibly evicting a weaker proposer-funded entry, or
//! - rejects it.
//!
//! When an active proposal completes, its slot is released and the next
//! eligible entry can be activated.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Sorted by priority, descending | `domain/queue.rs` - `insertion_index()` |
//! | FIFO among equal priority | `domain/queue.rs` - insert before first strictly lower |
//! | `active ≤ max_concurrent_proposals` | `domain/admission.rs` - `ConcurrencySlots` |
//! | At most one DAO-funded proposal active | `domain/admission.rs` - `DaoLiquiditySlot` |
//! | `bond.is_some() == uses_dao_liquidity` | `domain/entities.rs` - `QueuedProposal::new()` |
//! | Eviction needs strictly higher priority | `domain/queue.rs` - `plan_eviction()` |
//!
//! ## DoS Fee Escalation
//!
//! | Occupancy | Minimum fee |
//! |-----------|-------------|
//! | < 50% | `MIN_FEE` |
//! | ≥ 50% | `MIN_FEE × 2` |
//! | ≥ 75% | `MIN_FEE × 5` |
//! | ≥ 90% | `MIN_FEE × 10` |
//!
//! ## Module Structure
//!
//! ```text
//! domain/entities.rs  - ProposalData, QueuedProposal<S>
//! domain/fees.rs      - fee bounds, minimum fee, priority
//! domain/admission.rs - ConcurrencySlots, DaoLiquiditySlot
//! domain/queue.rs     - ProposalQueue<S>
//! config.rs           - QueueConfig
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;

pub use config::QueueConfig;
pub use domain::{
    calculate_min_fee, priority_for_fee, Admission, ConcurrencySlots, DaoLiquiditySlot,
    ProposalData, ProposalQueue, QueueError, QueueResult, QueuedProposal, MAX_FEE,
    MAX_QUEUE_SIZE, MIN_FEE, MIN_QUEUE_SIZE,
};

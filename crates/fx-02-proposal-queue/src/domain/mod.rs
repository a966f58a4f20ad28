//! Domain layer for the proposal queue.

pub mod admission;
pub mod entities;
pub mod errors;
pub mod fees;
pub mod queue;

pub use admission::{ConcurrencySlots, DaoLiquiditySlot};
pub use entities::{ProposalData, QueuedProposal};
pub use errors::{QueueError, QueueResult};
pub use fees::{
    calculate_min_fee, priority_for_fee, MAX_FEE, MAX_QUEUE_SIZE, MIN_FEE, MIN_QUEUE_SIZE,
};
pub use queue::{Admission, ProposalQueue};

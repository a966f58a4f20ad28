//! Domain layer for the proposal lifecycle.

pub mod errors;
pub mod proposal;
pub mod transitions;
pub mod twap;

pub use errors::{LifecycleError, LifecycleResult};
pub use proposal::{Proposal, ProposalStage};
pub use transitions::{finalize, try_advance_state};
pub use twap::{select_winner, TWAP_BPS_SCALE};

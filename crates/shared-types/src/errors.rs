//! # Failure Taxonomy
//!
//! Every subsystem error maps onto exactly one `FailureKind`. All kinds abort
//! the enclosing operation with no partial mutation; only
//! `TimingNotReached` is worth retrying without an external state change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an aborted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Operation invalid for the current lifecycle state.
    StateViolation,
    /// Queue, concurrency or DAO slot full with no valid eviction.
    CapacityExceeded,
    /// Malformed input or mismatched identity.
    ValidationFailure,
    /// Time-guarded transition attempted too early.
    TimingNotReached,
}

impl FailureKind {
    /// True if the same call may succeed later without anyone else acting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TimingNotReached)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StateViolation => "state_violation",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::ValidationFailure => "validation_failure",
            Self::TimingNotReached => "timing_not_reached",
        };
        f.write_str(name)
    }
}

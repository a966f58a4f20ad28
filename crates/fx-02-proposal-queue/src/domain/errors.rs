//! Proposal queue error types.

use shared_types::{DaoId, FailureKind, ProposalId, ShortId};
use thiserror::Error;

/// Proposal queue errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    // =========================================================================
    // CAPACITY
    // =========================================================================
    #[error("Queue full ({capacity} entries)")]
    QueueFull { capacity: usize },

    /// Proposer-funded capacity reached and no entry is weak enough to evict.
    #[error("Proposer-funded capacity {limit} reached: priority {priority} does not beat weakest {weakest}")]
    ProposerFundedFull {
        limit: usize,
        priority: u64,
        weakest: u64,
    },

    #[error("All {capacity} concurrency slots in use")]
    ConcurrencyFull { capacity: u64 },

    #[error("DAO liquidity slot held by {holder} and all {capacity} slots in use")]
    DaoSlotUnavailable { holder: ShortId, capacity: u64 },

    // =========================================================================
    // VALIDATION
    // =========================================================================
    #[error("Fee {fee} below minimum {minimum}")]
    FeeTooLow { fee: u64, minimum: u64 },

    #[error("Fee {fee} above maximum {maximum}")]
    FeeTooHigh { fee: u64, maximum: u64 },

    #[error("Bond mismatch: uses_dao_liquidity={uses_dao_liquidity}, bond present={has_bond}")]
    BondMismatch {
        uses_dao_liquidity: bool,
        has_bond: bool,
    },

    #[error("Proposal belongs to DAO {actual}, queue serves {expected}")]
    DaoMismatch { expected: ShortId, actual: ShortId },

    #[error("Proposal {0} already queued")]
    DuplicateProposal(ShortId),

    #[error("Proposal {0} not found in queue")]
    ProposalNotFound(ShortId),

    #[error("Caller is not the proposer of {0}")]
    NotProposer(ShortId),

    #[error("Invalid proposal data: {0}")]
    InvalidProposalData(String),

    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // STATE
    // =========================================================================
    /// `mark_proposal_completed` without a matching activation.
    #[error("No active proposal to complete")]
    ActiveCountUnderflow,

    #[error("DAO liquidity slot is not occupied")]
    DaoSlotNotOccupied,
}

impl QueueError {
    /// Failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::QueueFull { .. }
            | Self::ProposerFundedFull { .. }
            | Self::ConcurrencyFull { .. }
            | Self::DaoSlotUnavailable { .. } => FailureKind::CapacityExceeded,
            Self::ActiveCountUnderflow | Self::DaoSlotNotOccupied => FailureKind::StateViolation,
            _ => FailureKind::ValidationFailure,
        }
    }

    pub(crate) fn dao_mismatch(expected: &DaoId, actual: &DaoId) -> Self {
        Self::DaoMismatch {
            expected: ShortId::of(expected),
            actual: ShortId::of(actual),
        }
    }

    pub(crate) fn not_found(id: &ProposalId) -> Self {
        Self::ProposalNotFound(ShortId::of(id))
    }
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

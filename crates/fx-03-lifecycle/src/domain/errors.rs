//! Lifecycle error types.

use crate::domain::proposal::ProposalStage;
use crate::ports::outbound::OracleError;
use fx_01_market_state::MarketError;
use fx_02_proposal_queue::QueueError;
use shared_types::{FailureKind, Timestamp};
use thiserror::Error;

/// Lifecycle errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// No transition is defined out of this stage.
    #[error("Invalid state transition from {stage:?}")]
    InvalidStateTransition { stage: ProposalStage },

    #[error("Review period not elapsed: now {now}, trading opens at {ready_at}")]
    ReviewPeriodNotElapsed { now: Timestamp, ready_at: Timestamp },

    #[error("Still in trading period: now {now}, trading ends at {trading_end}")]
    InTradingPeriod {
        now: Timestamp,
        trading_end: Timestamp,
    },

    #[error("Market has no trading end time")]
    TradingEndUnknown,

    // =========================================================================
    // IDENTITY LINKAGE
    // =========================================================================
    #[error("Market state does not belong to this proposal")]
    MarketMismatch,

    #[error("Market, proposal or queue belong to different DAOs")]
    DaoMismatch,

    #[error("Outcome count mismatch: proposal {proposal}, market {market}")]
    OutcomeCountMismatch { proposal: u64, market: u64 },

    #[error("Expected {expected} pools, got {actual}")]
    PoolCountMismatch { expected: usize, actual: usize },

    #[error("Pool for outcome {outcome} is not linked to this proposal")]
    PoolMismatch { outcome: usize },

    // =========================================================================
    // COLLABORATORS
    // =========================================================================
    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Invalid lifecycle configuration: {0}")]
    InvalidConfig(String),
}

impl LifecycleError {
    /// Failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ReviewPeriodNotElapsed { .. } | Self::InTradingPeriod { .. } => {
                FailureKind::TimingNotReached
            }
            Self::InvalidStateTransition { .. } | Self::TradingEndUnknown => {
                FailureKind::StateViolation
            }
            Self::Market(e) => e.kind(),
            Self::Queue(e) => e.kind(),
            Self::Oracle(OracleError::NotReady(_)) => FailureKind::TimingNotReached,
            _ => FailureKind::ValidationFailure,
        }
    }

    /// True if the same call may succeed later without anyone else acting.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

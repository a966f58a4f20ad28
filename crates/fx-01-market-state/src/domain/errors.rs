//! Error types for market state transitions.

use shared_types::FailureKind;
use thiserror::Error;

/// Market state errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("Trading already started")]
    TradingAlreadyStarted,

    #[error("Trading not started")]
    TradingNotStarted,

    #[error("Trading already ended")]
    TradingAlreadyEnded,

    #[error("Trading has not ended")]
    TradingNotEnded,

    /// `assert_trading_active` failed.
    #[error("Trading is not active")]
    TradingNotActive,

    #[error("Market already finalized")]
    AlreadyFinalized,

    #[error("Market not finalized")]
    NotFinalized,

    #[error("Outcome {outcome} out of range (outcome count {outcome_count})")]
    OutcomeOutOfRange { outcome: u64, outcome_count: u64 },

    #[error("Invalid outcome count {count}: must be between {min} and {max}")]
    InvalidOutcomeCount { count: usize, min: usize, max: usize },

    #[error("Trading end overflows: start {start} + duration {duration_ms}ms")]
    TradingEndOverflow { start: u64, duration_ms: u64 },
}

impl MarketError {
    /// Failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::OutcomeOutOfRange { .. }
            | Self::InvalidOutcomeCount { .. }
            | Self::TradingEndOverflow { .. } => FailureKind::ValidationFailure,
            _ => FailureKind::StateViolation,
        }
    }
}

/// Result type for market operations.
pub type MarketResult<T> = Result<T, MarketError>;

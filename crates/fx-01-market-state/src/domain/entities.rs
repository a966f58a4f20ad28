//! Market state entity and its forward-only transitions.
//!
//! Each transition is split in two: an `ensure_*` check that reads only, and
//! the mutator that calls it before touching any field. Coordinators that
//! chain several transitions run every check first so that a failure in a
//! later step leaves the market untouched.

use crate::domain::errors::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use shared_bus::{GovernanceEvent, Outbox};
use shared_types::{
    Clock, DaoId, MarketId, ShortId, Timestamp, MAX_OUTCOMES, MIN_OUTCOMES,
};
use tracing::info;

/// One-way status flags. `finalized ⟹ trading_ended ⟹ trading_started`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub trading_started: bool,
    pub trading_ended: bool,
    pub finalized: bool,
}

/// Trading status record of a single proposal's market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    market_id: MarketId,
    dao_id: DaoId,
    outcome_count: u64,
    outcome_messages: Vec<String>,
    status: MarketStatus,
    /// Some iff `status.finalized`.
    winning_outcome: Option<u64>,
    creation_time: Timestamp,
    trading_start: Option<Timestamp>,
    trading_end: Option<Timestamp>,
    finalization_time: Option<Timestamp>,
}

impl MarketState {
    /// Create a market in the not-started status.
    pub fn new(
        market_id: MarketId,
        dao_id: DaoId,
        outcome_messages: Vec<String>,
        clock: &dyn Clock,
    ) -> MarketResult<Self> {
        let count = outcome_messages.len();
        if !(MIN_OUTCOMES..=MAX_OUTCOMES).contains(&count) {
            return Err(MarketError::InvalidOutcomeCount {
                count,
                min: MIN_OUTCOMES,
                max: MAX_OUTCOMES,
            });
        }

        Ok(Self {
            market_id,
            dao_id,
            outcome_count: count as u64,
            outcome_messages,
            status: MarketStatus::default(),
            winning_outcome: None,
            creation_time: clock.timestamp_ms(),
            trading_start: None,
            trading_end: None,
            finalization_time: None,
        })
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Check that `start_trading(duration_ms)` at `now` would succeed.
    /// Returns the trading end time.
    pub fn ensure_can_start_trading(&self, duration_ms: u64, now: Timestamp) -> MarketResult<Timestamp> {
        if self.status.trading_started {
            return Err(MarketError::TradingAlreadyStarted);
        }
        now.checked_add(duration_ms)
            .ok_or(MarketError::TradingEndOverflow {
                start: now,
                duration_ms,
            })
    }

    /// Open the trading window for `duration_ms`.
    pub fn start_trading(
        &mut self,
        duration_ms: u64,
        clock: &dyn Clock,
        outbox: &mut Outbox,
    ) -> MarketResult<()> {
        let now = clock.timestamp_ms();
        let end = self.ensure_can_start_trading(duration_ms, now)?;

        self.status.trading_started = true;
        self.trading_start = Some(now);
        self.trading_end = Some(end);

        info!(
            market = %ShortId::of(&self.market_id),
            start = now,
            end,
            "Trading started"
        );
        outbox.emit(GovernanceEvent::TradingStarted {
            market_id: self.market_id,
            dao_id: self.dao_id,
            start: now,
            end,
        });
        Ok(())
    }

    pub fn ensure_can_end_trading(&self) -> MarketResult<()> {
        if !self.status.trading_started {
            return Err(MarketError::TradingNotStarted);
        }
        if self.status.trading_ended {
            return Err(MarketError::TradingAlreadyEnded);
        }
        Ok(())
    }

    /// Close the trading window.
    pub fn end_trading(&mut self, clock: &dyn Clock, outbox: &mut Outbox) -> MarketResult<()> {
        self.ensure_can_end_trading()?;

        let now = clock.timestamp_ms();
        self.status.trading_ended = true;

        info!(market = %ShortId::of(&self.market_id), at = now, "Trading ended");
        outbox.emit(GovernanceEvent::TradingEnded {
            market_id: self.market_id,
            dao_id: self.dao_id,
            timestamp: now,
        });
        Ok(())
    }

    /// Check that `finalize(winner)` would succeed once trading has ended.
    ///
    /// `assume_ended` lets a coordinator validate a finalize that will
    /// follow an `end_trading` in the same operation.
    pub fn ensure_can_finalize(&self, winner: u64, assume_ended: bool) -> MarketResult<()> {
        if !(self.status.trading_ended || assume_ended) {
            return Err(MarketError::TradingNotEnded);
        }
        if self.status.finalized {
            return Err(MarketError::AlreadyFinalized);
        }
        if winner >= self.outcome_count {
            return Err(MarketError::OutcomeOutOfRange {
                outcome: winner,
                outcome_count: self.outcome_count,
            });
        }
        Ok(())
    }

    /// Record the winning outcome.
    pub fn finalize(&mut self, winner: u64, clock: &dyn Clock, outbox: &mut Outbox) -> MarketResult<()> {
        self.ensure_can_finalize(winner, false)?;

        let now = clock.timestamp_ms();
        self.status.finalized = true;
        self.winning_outcome = Some(winner);
        self.finalization_time = Some(now);

        info!(
            market = %ShortId::of(&self.market_id),
            winner,
            "Market finalized"
        );
        outbox.emit(GovernanceEvent::MarketFinalized {
            market_id: self.market_id,
            dao_id: self.dao_id,
            winning_outcome: winner,
            timestamp: now,
        });
        Ok(())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn dao_id(&self) -> DaoId {
        self.dao_id
    }

    pub fn outcome_count(&self) -> u64 {
        self.outcome_count
    }

    pub fn outcome_messages(&self) -> &[String] {
        &self.outcome_messages
    }

    pub fn status(&self) -> MarketStatus {
        self.status
    }

    pub fn creation_time(&self) -> Timestamp {
        self.creation_time
    }

    pub fn trading_start(&self) -> Option<Timestamp> {
        self.trading_start
    }

    /// End of the trading window, once trading has started.
    pub fn trading_end_time(&self) -> Option<Timestamp> {
        self.trading_end
    }

    pub fn finalization_time(&self) -> Option<Timestamp> {
        self.finalization_time
    }

    pub fn is_trading_active(&self) -> bool {
        self.status.trading_started && !self.status.trading_ended
    }

    pub fn is_finalized(&self) -> bool {
        self.status.finalized
    }

    pub fn get_winning_outcome(&self) -> MarketResult<u64> {
        self.winning_outcome.ok_or(MarketError::NotFinalized)
    }
}

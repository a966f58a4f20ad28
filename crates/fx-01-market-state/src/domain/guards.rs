//! Guards for collaborators that mutate state tied to a market.
//!
//! Several independently submitted operations may race to act on the same
//! market. Only the first passes its guard; the rest abort.

use crate::domain::entities::MarketState;
use crate::domain::errors::{MarketError, MarketResult};
use shared_types::ShortId;
use tracing::debug;

impl MarketState {
    /// Passes while the trading window is open.
    pub fn assert_trading_active(&self) -> MarketResult<()> {
        if !self.is_trading_active() {
            debug!(market = %ShortId::of(&self.market_id()), "Guard failed: trading not active");
            return Err(MarketError::TradingNotActive);
        }
        Ok(())
    }

    /// Passes before trading has ended (not started or trading).
    pub fn assert_in_trading_or_pre_trading(&self) -> MarketResult<()> {
        if self.status().trading_ended {
            debug!(market = %ShortId::of(&self.market_id()), "Guard failed: trading ended");
            return Err(MarketError::TradingAlreadyEnded);
        }
        Ok(())
    }

    pub fn assert_market_finalized(&self) -> MarketResult<()> {
        if !self.is_finalized() {
            debug!(market = %ShortId::of(&self.market_id()), "Guard failed: not finalized");
            return Err(MarketError::NotFinalized);
        }
        Ok(())
    }

    pub fn assert_not_finalized(&self) -> MarketResult<()> {
        if self.is_finalized() {
            debug!(market = %ShortId::of(&self.market_id()), "Guard failed: already finalized");
            return Err(MarketError::AlreadyFinalized);
        }
        Ok(())
    }
}

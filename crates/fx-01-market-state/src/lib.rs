//! # fx-01-market-state
//!
//! Per-proposal trading status record. The single source of truth for a
//! market's timing and its winning outcome.
//!
//! ## Status Machine
//!
//! ```text
//! [NOT STARTED] ──start_trading──→ [TRADING] ──end_trading──→ [ENDED] ──finalize(w)──→ [FINALIZED]
//! ```
//!
//! Every transition is re-validated against its own flag, so a duplicate or
//! late call aborts instead of applying twice. Flags only ever go from
//! `false` to `true`: `finalized ⟹ ended ⟹ started`.
//!
//! ## Guards
//!
//! Collaborators that mutate state tied to a market call one of the guards
//! first:
//!
//! | Guard | Passes when |
//! |-------|-------------|
//! | `assert_trading_active` | started and not ended |
//! | `assert_in_trading_or_pre_trading` | not ended |
//! | `assert_market_finalized` | finalized |
//! | `assert_not_finalized` | not finalized |
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut market = MarketState::new(market_id, dao_id, outcomes, &clock)?;
//! let mut outbox = Outbox::new();
//! market.start_trading(1_000_000, &clock, &mut outbox)?;
//! // ... trading window elapses ...
//! market.end_trading(&clock, &mut outbox)?;
//! market.finalize(1, &clock, &mut outbox)?;
//! outbox.commit(&bus, &refunds, &settlements);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;

pub use domain::{MarketError, MarketResult, MarketState, MarketStatus};

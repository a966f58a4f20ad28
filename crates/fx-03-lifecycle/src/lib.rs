//! # Lifecycle Coordinator
//!
//! Drives a proposal and its market through a strict, time-gated stage
//! machine and selects the winning outcome from per-outcome TWAPs.
//!
//! ## Stage Machine
//!
//! ```text
//! [PREMARKET 0]    [REVIEW 1] ──review period──→ [TRADING 2] ──trading end + TWAP tally──→ [FINALIZED 3]
//!  (declared,
//!  unreachable)
//! ```
//!
//! | Transition | Guard | Effect |
//! |------------|-------|--------|
//! | Review → Trading | `now ≥ market_initialized_at + review_period_ms` | `start_trading(trading_period_ms)` |
//! | Trading → Finalized | `now ≥ trading_end` | `end_trading()`, TWAP winner, `finalize(winner)` |
//!
//! Any other stage aborts with `InvalidStateTransition`. Guards are checked
//! on every call, so keepers may crank freely: an early call fails with a
//! retryable timing error, a duplicate call fails with a state error.
//!
//! ## Winner Selection
//!
//! Outcome 0 is the baseline ("reject"). Outcome `i > 0` wins iff its TWAP is
//! strictly above every earlier challenger and strictly above
//! `twap[0] × (100_000 + threshold_bps) / 100_000`. Otherwise outcome 0 wins.
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `TwapOracle` | Per-outcome AMM TWAP |
//! | `FeeSink` | Pay the escrowed fee to the treasury or an outcome creator |
//! | `LiquidityRedeemer` | Return liquidity to the DAO pool or the provider |
//!
//! ## Settlement
//!
//! The finalizing transition never calls `FeeSink` or `LiquidityRedeemer`.
//! It stages one fee order and one redemption order in the outbox. After the
//! caller commits, a `SettlementExecutor` performs each order through the
//! ports and acknowledges it on success, so a failed redemption is retried
//! alone and the fee is never paid twice.
//!
//! ## Module Structure
//!
//! ```text
//! domain/proposal.rs    - Proposal, ProposalStage
//! domain/twap.rs        - select_winner (pure)
//! domain/transitions.rs - try_advance_state, finalize
//! ports/outbound.rs     - TwapOracle, FeeSink, LiquidityRedeemer
//! application/service.rs - LifecycleCoordinator (activation, settlement orders)
//! application/settlement.rs - SettlementExecutor
//! config.rs             - LifecycleConfig, GovernanceConfig
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{Activation, LifecycleCoordinator, SettlementExecutor};
pub use config::{GovernanceConfig, LifecycleConfig, LifecycleConfigUpdate};
pub use domain::{
    finalize, select_winner, try_advance_state, LifecycleError, LifecycleResult, Proposal,
    ProposalStage, TWAP_BPS_SCALE,
};
pub use ports::{FeeSink, LiquidityRedeemer, OracleError, SettlementError, TwapOracle};

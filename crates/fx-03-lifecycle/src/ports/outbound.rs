//! Outbound Ports (Driven Ports / SPI)
//!
//! Settlement ports are never called while a proposal is being finalized.
//! They receive committed [`SettlementOrder`]s from the settlement executor,
//! one order per call, and may see the same order again if an earlier call
//! succeeded but was not acknowledged. Implementations must be idempotent on
//! the order id.

use shared_bus::SettlementOrder;
use shared_types::{Address, Clock, PoolId};
use thiserror::Error;

/// TWAP oracle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// The pool has not accumulated enough observations yet.
    #[error("TWAP not ready for pool {0:02x?}")]
    NotReady(PoolId),

    #[error("TWAP read failed: {0}")]
    Failed(String),
}

/// Settlement port errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Fee transfer failed: {0}")]
    FeeTransfer(String),

    #[error("Liquidity redemption failed: {0}")]
    Redemption(String),
}

/// Time-weighted average price of one outcome's AMM pool.
pub trait TwapOracle: Send + Sync {
    /// Pool this oracle reads.
    fn pool_id(&self) -> PoolId;

    /// TWAP over the trading window as of `clock`.
    fn get_twap(&self, clock: &dyn Clock) -> Result<u128, OracleError>;
}

/// Destination of the escrowed proposal fee.
pub trait FeeSink: Send + Sync {
    /// Baseline outcome won: the fee goes to the DAO treasury.
    fn deposit_to_treasury(&self, order: &SettlementOrder, amount: u64) -> Result<(), SettlementError>;

    /// A challenger won: the fee goes to that outcome's creator.
    fn pay_outcome_creator(
        &self,
        order: &SettlementOrder,
        recipient: Address,
        amount: u64,
    ) -> Result<(), SettlementError>;
}

/// Returns outcome liquidity once a proposal is finalized.
pub trait LiquidityRedeemer: Send + Sync {
    /// DAO-funded proposal: liquidity flows back to the DAO pool.
    fn redeem_to_dao(&self, order: &SettlementOrder, winning_outcome: u64) -> Result<(), SettlementError>;

    /// Proposer-funded proposal: liquidity flows back to its provider.
    fn redeem_to_provider(
        &self,
        order: &SettlementOrder,
        provider: Address,
        winning_outcome: u64,
    ) -> Result<(), SettlementError>;
}

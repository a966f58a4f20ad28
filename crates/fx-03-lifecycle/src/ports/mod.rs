//! Ports for external collaborators.

pub mod outbound;

pub use outbound::{FeeSink, LiquidityRedeemer, OracleError, SettlementError, TwapOracle};

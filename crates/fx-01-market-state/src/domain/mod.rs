//! Domain layer for market state.

pub mod entities;
pub mod errors;
pub mod guards;

pub use entities::{MarketState, MarketStatus};
pub use errors::{MarketError, MarketResult};

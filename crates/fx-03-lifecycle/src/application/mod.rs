//! Application layer.

pub mod service;
pub mod settlement;

pub use service::{Activation, LifecycleCoordinator};
pub use settlement::SettlementExecutor;

//! Cross-crate integration tests.

pub mod fixtures;
mod scenarios;
mod settlement;

//! # Futarchy Engine Test Suite
//!
//! Cross-crate tests that drive the queue, market state and lifecycle
//! coordinator together through the shared outbox, event bus and refund
//! ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # Eviction, market lifecycle, timed finalization
//!     └── settlement.rs  # Full proposal runs with bus subscribers and refund worker
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fx-tests
//! cargo test -p fx-tests integration::scenarios::
//!
//! # Benchmarks
//! cargo bench -p fx-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

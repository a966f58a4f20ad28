//! Trusted time source.
//!
//! Every time-gated guard reads a `Clock` so that tests can drive time
//! deterministically and hosts can inject their own notion of "now".

use crate::entities::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic millisecond clock.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn timestamp_ms(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp_ms(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    time: AtomicU64,
}

impl ManualClock {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn timestamp_ms(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

//! Configuration for a DAO's proposal queue.

use crate::domain::errors::{QueueError, QueueResult};
use crate::domain::fees::{MAX_QUEUE_SIZE, MIN_QUEUE_SIZE};
use serde::{Deserialize, Serialize};

/// Queue configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queued proposer-funded entries allowed before a newcomer must evict
    pub max_proposer_funded: usize,
    /// Proposals allowed in trading at the same time
    pub max_concurrent_proposals: u64,
    /// Hard cap on queued entries (10..=50)
    pub max_queue_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_proposer_funded: 30,
            max_concurrent_proposals: 3,
            max_queue_size: MAX_QUEUE_SIZE,
        }
    }
}

impl QueueConfig {
    /// Small limits that make eviction and slot contention easy to reach.
    pub fn for_testing() -> Self {
        Self {
            max_proposer_funded: 3,
            max_concurrent_proposals: 1,
            max_queue_size: MIN_QUEUE_SIZE,
        }
    }

    pub fn validate(&self) -> QueueResult<()> {
        if !(MIN_QUEUE_SIZE..=MAX_QUEUE_SIZE).contains(&self.max_queue_size) {
            return Err(QueueError::InvalidConfig(format!(
                "max_queue_size {} outside {MIN_QUEUE_SIZE}..={MAX_QUEUE_SIZE}",
                self.max_queue_size
            )));
        }
        if self.max_concurrent_proposals == 0 {
            return Err(QueueError::InvalidConfig(
                "max_concurrent_proposals must be at least 1".into(),
            ));
        }
        if self.max_proposer_funded == 0 || self.max_proposer_funded > self.max_queue_size {
            return Err(QueueError::InvalidConfig(format!(
                "max_proposer_funded {} outside 1..={}",
                self.max_proposer_funded, self.max_queue_size
            )));
        }
        Ok(())
    }
}

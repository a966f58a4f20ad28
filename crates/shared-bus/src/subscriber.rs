//! # Event Subscriber
//!
//! Receiving side of the bus. Each subscription filters the shared broadcast
//! stream by topic and DAO, and unregisters itself when dropped.

use crate::events::{EventFilter, GovernanceEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped and every buffered event has been read.
    #[error("Event bus closed")]
    Closed,
}

/// Filters of the live subscriptions, used to count interested receivers.
#[derive(Debug, Default)]
pub(crate) struct SubscriberRegistry {
    filters: Mutex<Vec<(u64, EventFilter)>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    fn register(&self, filter: &EventFilter) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.filters.lock().push((id, filter.clone()));
        id
    }

    fn unregister(&self, id: u64) {
        self.filters.lock().retain(|(other, _)| *other != id);
    }

    pub(crate) fn interested_in(&self, event: &GovernanceEvent) -> usize {
        self.filters
            .lock()
            .iter()
            .filter(|(_, filter)| filter.matches(event))
            .count()
    }
}

/// Handle to a stream of matching events.
pub struct Subscription {
    receiver: broadcast::Receiver<GovernanceEvent>,
    filter: EventFilter,
    registry: Arc<SubscriberRegistry>,
    id: u64,
    /// Events skipped because this subscriber lagged.
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<GovernanceEvent>,
        filter: EventFilter,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        let id = registry.register(&filter);
        Self {
            receiver,
            filter,
            registry,
            id,
            missed: 0,
        }
    }

    fn note_lag(&mut self, skipped: u64) {
        self.missed += skipped;
        warn!(skipped, total = self.missed, "Subscriber lagged, events dropped");
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<GovernanceEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => self.note_lag(skipped),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered matching event, if any.
    pub fn try_recv(&mut self) -> Result<Option<GovernanceEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => self.note_lag(skipped),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Every matching event buffered right now, in publish order.
    pub fn drain(&mut self) -> Vec<GovernanceEvent> {
        std::iter::from_fn(|| self.try_recv().ok().flatten()).collect()
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Events this subscriber never saw because its buffer overflowed.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
        debug!(subscription = self.id, "Subscriber unregistered");
    }
}

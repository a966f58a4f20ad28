//! # Event Publisher
//!
//! Fan-out of committed governance events to in-process subscribers.

use crate::events::{EventFilter, EventTopic, GovernanceEvent};
use crate::subscriber::{SubscriberRegistry, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Sink for committed events.
///
/// Synchronous on purpose: an outbox is committed at the end of a governance
/// operation, and operations never await.
pub trait EventPublisher: Send + Sync {
    /// Deliver one event. Returns how many subscriptions will see it.
    fn publish(&self, event: GovernanceEvent) -> usize;

    /// Events accepted since creation, delivered or not.
    fn events_published(&self) -> u64;
}

/// Broadcast-backed bus shared by the queue, market and lifecycle crates.
///
/// Every subscriber gets its own bounded buffer of `capacity` events; a
/// subscriber that falls further behind skips the oldest ones.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<GovernanceEvent>,
    registry: Arc<SubscriberRegistry>,
    /// Published events per topic.
    published: Mutex<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            registry: Arc::new(SubscriberRegistry::default()),
            published: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Open a subscription. Only events published after this call are seen.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(
            topics = ?filter.topics,
            daos = filter.dao_ids.len(),
            "Subscriber registered"
        );
        Subscription::new(self.sender.subscribe(), filter, Arc::clone(&self.registry))
    }

    /// Live subscriptions, matching or not.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Live subscriptions whose filter accepts `event`.
    #[must_use]
    pub fn interested_in(&self, event: &GovernanceEvent) -> usize {
        self.registry.interested_in(event)
    }

    /// Events published so far on `topic`.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        match topic {
            EventTopic::All => self.events_published(),
            topic => self.published.lock().get(&topic).copied().unwrap_or(0),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: GovernanceEvent) -> usize {
        let topic = event.topic();
        *self.published.lock().entry(topic).or_insert(0) += 1;

        let interested = self.registry.interested_in(&event);
        // A send error only means nobody is subscribed right now.
        if self.sender.send(event).is_err() {
            trace!(?topic, "Event committed with no subscribers");
            return 0;
        }
        debug!(?topic, interested, "Event published");
        interested
    }

    fn events_published(&self) -> u64 {
        self.published.lock().values().sum()
    }
}

//! In-memory event bus for tests and single-process deployments.

use crate::events::{
    domain::EventEnvelope,
    ports::{EventBus, EventBusError, EventBusResult},
};
use async_trait::async_trait;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Event bus that records every envelope and fans it out to subscribers.
#[derive(Debug, Clone)]
pub struct InMemoryEventBus {
    published: Arc<RwLock<Vec<EventEnvelope>>>,
    sender: broadcast::Sender<EventEnvelope>,
    failures: Arc<AtomicUsize>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty bus whose subscribers buffer `capacity` envelopes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
            sender,
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Subscribes to envelopes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Makes the next `count` publishes fail as unavailable.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Returns every envelope published so far.
    #[must_use]
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.published
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns the published event type names in order.
    #[must_use]
    pub fn detail_types(&self) -> Vec<&'static str> {
        self.published()
            .iter()
            .map(EventEnvelope::detail_type)
            .collect()
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, envelope: &EventEnvelope) -> EventBusResult<()> {
        if self.take_failure() {
            return Err(EventBusError::unavailable(std::io::Error::other(
                "injected event bus failure",
            )));
        }
        self.published
            .write()
            .map_err(|err| EventBusError::unavailable(std::io::Error::other(err.to_string())))?
            .push(envelope.clone());
        // No subscribers is not an error for a fan-out bus.
        let _ = self.sender.send(envelope.clone());
        Ok(())
    }
}

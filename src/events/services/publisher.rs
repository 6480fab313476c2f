//! Validating publisher used after committed writes.

use crate::events::{
    domain::{DomainEvent, EventEnvelope, EventValidationError},
    ports::{EventBus, EventBusError},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by [`EventPublisher::publish`].
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The payload failed validation and was not sent.
    #[error(transparent)]
    Invalid(#[from] EventValidationError),

    /// The bus did not accept the envelope.
    #[error(transparent)]
    Bus(#[from] EventBusError),
}

/// Wraps domain events in envelopes and hands them to the bus.
#[derive(Debug)]
pub struct EventPublisher<B>
where
    B: EventBus,
{
    bus: Arc<B>,
    source: String,
}

impl<B> Clone for EventPublisher<B>
where
    B: EventBus,
{
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            source: self.source.clone(),
        }
    }
}

impl<B> EventPublisher<B>
where
    B: EventBus,
{
    /// Creates a publisher tagging envelopes with `source`.
    #[must_use]
    pub fn new(bus: Arc<B>, source: impl Into<String>) -> Self {
        Self {
            bus,
            source: source.into(),
        }
    }

    /// Returns a publisher for the same bus with a different source tag.
    #[must_use]
    pub fn with_source(self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self
        }
    }

    /// Returns the source tag.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Validates and publishes `event`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Invalid`] for incomplete payloads and
    /// [`PublishError::Bus`] when the bus fails.
    pub async fn publish(
        &self,
        event: DomainEvent,
        occurred_at: DateTime<Utc>,
    ) -> Result<EventEnvelope, PublishError> {
        event.validate()?;
        let envelope = EventEnvelope::new(self.source.clone(), event, occurred_at);
        self.bus.publish(&envelope).await?;
        debug!(
            event_id = %envelope.event_id(),
            detail_type = envelope.detail_type(),
            task_id = %envelope.event().task_id(),
            "published event"
        );
        Ok(envelope)
    }

    /// Publishes an event for a write that has already committed.
    ///
    /// Failures are logged and swallowed: the write stands and the caller
    /// still sees success.
    pub async fn publish_committed(&self, event: DomainEvent, occurred_at: DateTime<Utc>) {
        let detail_type = event.detail_type();
        let task_id = event.task_id().clone();
        if let Err(err) = self.publish(event, occurred_at).await {
            warn!(
                detail_type,
                task_id = %task_id,
                error = %err,
                "event publish failed after commit"
            );
        }
    }
}

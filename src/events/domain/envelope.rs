//! Envelope wrapping an event on the bus.

use super::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source tag for events produced by the task services.
pub const TASK_SERVICE_SOURCE: &str = "tasklane";

/// Source tag for events produced from repository webhooks.
pub const REPOSITORY_TRIGGER_SOURCE: &str = "tasklane.repository";

/// A published event together with its routing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    event_id: Uuid,
    occurred_at: DateTime<Utc>,
    source: String,
    event: DomainEvent,
}

impl EventEnvelope {
    /// Wraps `event` with a fresh identifier.
    #[must_use]
    pub fn new(source: impl Into<String>, event: DomainEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at,
            source: source.into(),
            event,
        }
    }

    /// Returns the envelope identifier.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Returns when the underlying mutation committed.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the source tag.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the wrapped event.
    #[must_use]
    pub const fn event(&self) -> &DomainEvent {
        &self.event
    }

    /// Returns the event type name.
    #[must_use]
    pub const fn detail_type(&self) -> &'static str {
        self.event.detail_type()
    }
}

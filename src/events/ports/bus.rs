//! Event bus port.

use crate::events::domain::EventEnvelope;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Errors returned by event bus implementations.
#[derive(Debug, Clone, Error)]
pub enum EventBusError {
    /// The bus refused the entry.
    #[error("event rejected by bus: {0}")]
    Rejected(String),

    /// The bus could not be reached.
    #[error("event bus unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl EventBusError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

/// Publish-only event bus.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a single envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError`] when the bus rejects or cannot accept the
    /// envelope.
    async fn publish(&self, envelope: &EventEnvelope) -> EventBusResult<()>;
}

//! Message delivery port.

use crate::notification::domain::OutboundMessage;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Errors returned by message providers.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The provider refused the address or message.
    #[error("delivery to {address} rejected: {reason}")]
    Rejected {
        /// Recipient address.
        address: String,
        /// Provider reason.
        reason: String,
    },

    /// The provider could not be reached.
    #[error("message provider unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

/// Message-delivery provider.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends one message.
    async fn send(&self, message: &OutboundMessage) -> DeliveryResult<()>;
}

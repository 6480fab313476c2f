//! In-memory outbox.

use crate::notification::{
    domain::OutboundMessage,
    ports::{DeliveryError, DeliveryResult, MessageSender},
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<OutboundMessage>,
    rejected_addresses: BTreeSet<String>,
}

/// Records sent messages and rejects configured addresses.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageSender {
    outbox: Arc<RwLock<Outbox>>,
}

impl InMemoryMessageSender {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every message to `address`.
    pub fn reject(&self, address: impl Into<String>) {
        if let Ok(mut outbox) = self.outbox.write() {
            outbox.rejected_addresses.insert(address.into());
        }
    }

    /// Returns the messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.outbox
            .read()
            .map(|outbox| outbox.sent.clone())
            .unwrap_or_default()
    }

    /// Returns the messages sent to `address`.
    #[must_use]
    pub fn sent_to(&self, address: &str) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter(|message| message.to == address)
            .collect()
    }
}

#[async_trait]
impl MessageSender for InMemoryMessageSender {
    async fn send(&self, message: &OutboundMessage) -> DeliveryResult<()> {
        let mut outbox = self.outbox.write().map_err(|err| {
            DeliveryError::Unavailable(Arc::new(std::io::Error::other(err.to_string())))
        })?;
        if outbox.rejected_addresses.contains(&message.to) {
            return Err(DeliveryError::Rejected {
                address: message.to.clone(),
                reason: "address rejected".to_owned(),
            });
        }
        outbox.sent.push(message.clone());
        Ok(())
    }
}

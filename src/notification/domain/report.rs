//! Dispatch outcome.

use crate::identity::domain::UserId;

/// A delivery that failed for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelivery {
    /// Intended recipient.
    pub recipient: UserId,
    /// Provider error text.
    pub error: String,
}

/// Aggregate result of dispatching one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Messages accepted by the provider.
    pub sent: usize,
    /// Recipients skipped as absent or deactivated.
    pub skipped: usize,
    /// Recipients whose delivery failed.
    pub failed: Vec<FailedDelivery>,
}

impl DispatchReport {
    /// Returns `true` when no delivery failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

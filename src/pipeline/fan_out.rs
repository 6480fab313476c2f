//! Event fan-out to the index and notification consumers.

use crate::events::domain::EventEnvelope;
use crate::identity::ports::UserDirectory;
use crate::indexer::{
    domain::IndexOutcome,
    ports::SearchIndex,
    services::{ChangeCaptureIndexer, IndexerError},
};
use crate::notification::{
    domain::DispatchReport,
    ports::MessageSender,
    services::{NotificationDispatcher, NotificationError},
};
use crate::store::ports::KeyedStore;
use tokio::sync::{broadcast, broadcast::error::RecvError, watch};
use tracing::{info, warn};

/// What each consumer made of one envelope.
#[derive(Debug, Clone)]
pub struct FanOutOutcome {
    /// Result of the index refresh.
    pub index: Result<IndexOutcome, IndexerError>,
    /// Result of the notification dispatch.
    pub notify: Result<DispatchReport, NotificationError>,
}

/// Delivers published envelopes to the indexer and the notifier.
///
/// Consumer failures are logged and never reach the publisher.
pub struct EventFanOut<S, I, D, M>
where
    S: KeyedStore,
    I: SearchIndex,
    D: UserDirectory,
    M: MessageSender,
{
    indexer: ChangeCaptureIndexer<I, S>,
    dispatcher: NotificationDispatcher<S, D, M>,
}

impl<S, I, D, M> Clone for EventFanOut<S, I, D, M>
where
    S: KeyedStore,
    I: SearchIndex,
    D: UserDirectory,
    M: MessageSender,
{
    fn clone(&self) -> Self {
        Self {
            indexer: self.indexer.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S, I, D, M> EventFanOut<S, I, D, M>
where
    S: KeyedStore,
    I: SearchIndex,
    D: UserDirectory,
    M: MessageSender,
{
    /// Creates a fan-out over the two consumers.
    #[must_use]
    pub const fn new(
        indexer: ChangeCaptureIndexer<I, S>,
        dispatcher: NotificationDispatcher<S, D, M>,
    ) -> Self {
        Self {
            indexer,
            dispatcher,
        }
    }

    /// Hands one envelope to both consumers concurrently.
    pub async fn deliver(&self, envelope: &EventEnvelope) -> FanOutOutcome {
        let (index, notify) = tokio::join!(
            self.indexer.handle_event(envelope),
            self.dispatcher.dispatch(envelope)
        );
        if let Err(err) = &index {
            warn!(
                event_id = %envelope.event_id(),
                detail_type = envelope.detail_type(),
                error = %err,
                "index refresh failed"
            );
        }
        match &notify {
            Ok(report) if !report.is_clean() => warn!(
                event_id = %envelope.event_id(),
                failed = report.failed.len(),
                sent = report.sent,
                "some notifications were not delivered"
            ),
            Err(err) => warn!(
                event_id = %envelope.event_id(),
                detail_type = envelope.detail_type(),
                error = %err,
                "notification dispatch failed"
            ),
            Ok(_) => {}
        }
        FanOutOutcome { index, notify }
    }

    /// Delivers envelopes from `events` until the bus closes or `shutdown`
    /// becomes `true`. Returns the number of envelopes delivered.
    ///
    /// Envelopes dropped because the receiver lagged are logged and
    /// skipped; the change-capture path still converges the index.
    pub async fn run(
        &self,
        mut events: broadcast::Receiver<EventEnvelope>,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut delivered = 0;
        while !*shutdown.borrow() {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(envelope) => {
                        self.deliver(&envelope).await;
                        delivered += 1;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "event fan-out fell behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(delivered, "event fan-out stopped");
        delivered
    }
}

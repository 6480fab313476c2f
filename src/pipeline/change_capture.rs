//! Change-feed tailing.

use crate::indexer::{
    domain::{BatchReport, FailureReason},
    ports::SearchIndex,
    services::ChangeCaptureIndexer,
};
use crate::store::{
    domain::{ChangeRecord, ItemKey},
    ports::{ChangeFeed, KeyedStore, StoreResult},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Records read per poll unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Idle wait between polls unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Failed polls after which a key's records are dead-lettered.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// A change record the worker gave up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    /// The record that was never applied.
    pub record: ChangeRecord,
    /// Last error reported for the record's key.
    pub error: String,
    /// Polls in which the key failed.
    pub attempts: u32,
}

/// Records of one key waiting for a retry, in log order.
#[derive(Debug)]
struct PendingKey {
    records: Vec<ChangeRecord>,
    attempts: u32,
    last_error: String,
}

/// Reads the change feed in batches and applies them to the search index.
///
/// The read position always moves past the whole batch. Records of a key
/// that failed are parked and retried on the following polls together
/// with any newer records of the same key, which stay queued behind them.
/// A key that keeps failing for `max_attempts` polls is moved to the
/// dead-letter list. Other keys are never held up by a failing one.
pub struct ChangeCaptureWorker<F, I, S>
where
    F: ChangeFeed,
    I: SearchIndex,
    S: KeyedStore,
{
    feed: Arc<F>,
    indexer: ChangeCaptureIndexer<I, S>,
    checkpoint: Option<u64>,
    batch_size: usize,
    poll_interval: Duration,
    max_attempts: u32,
    pending: BTreeMap<ItemKey, PendingKey>,
    dead_letters: Vec<DeadLetter>,
}

impl<F, I, S> ChangeCaptureWorker<F, I, S>
where
    F: ChangeFeed,
    I: SearchIndex,
    S: KeyedStore,
{
    /// Creates a worker that starts from the beginning of the feed.
    #[must_use]
    pub const fn new(feed: Arc<F>, indexer: ChangeCaptureIndexer<I, S>) -> Self {
        Self {
            feed,
            indexer,
            checkpoint: None,
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pending: BTreeMap::new(),
            dead_letters: Vec::new(),
        }
    }

    /// Resumes after a previously stored checkpoint.
    #[must_use]
    pub const fn resume_after(mut self, sequence: u64) -> Self {
        self.checkpoint = Some(sequence);
        self
    }

    /// Sets the number of records read per poll. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the idle wait between polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets how many failed polls a key gets before it is dead-lettered.
    /// Zero is treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the last sequence read from the feed.
    #[must_use]
    pub const fn checkpoint(&self) -> Option<u64> {
        self.checkpoint
    }

    /// Returns the position a restarted worker should resume after.
    ///
    /// This sits just below the oldest record still waiting for a retry, so
    /// a restart replays it; otherwise it is the checkpoint.
    #[must_use]
    pub fn resume_point(&self) -> Option<u64> {
        self.pending
            .values()
            .flat_map(|pending| pending.records.iter())
            .map(|record| record.sequence)
            .min()
            .map_or(self.checkpoint, |oldest| {
                oldest.checked_sub(1).filter(|previous| *previous > 0)
            })
    }

    /// Returns the number of records waiting for a retry.
    #[must_use]
    pub fn pending_records(&self) -> usize {
        self.pending.values().map(|pending| pending.records.len()).sum()
    }

    /// Returns the records given up on, oldest first.
    #[must_use]
    pub fn dead_letters(&self) -> &[DeadLetter] {
        &self.dead_letters
    }

    /// Retries parked records and applies the next batch from the feed.
    ///
    /// # Errors
    ///
    /// Returns the feed error when the batch cannot be read. Index failures
    /// are reported in the [`BatchReport`] instead.
    pub async fn poll_once(&mut self) -> StoreResult<BatchReport> {
        self.poll().await.map(|(report, _)| report)
    }

    async fn poll(&mut self) -> StoreResult<(BatchReport, usize)> {
        let fresh = self.feed.read_since(self.checkpoint, self.batch_size).await?;
        let read = fresh.len();
        if let Some(last) = fresh.iter().map(|record| record.sequence).max() {
            self.checkpoint = Some(last);
        }

        let mut attempts = BTreeMap::new();
        let mut batch = Vec::new();
        for (key, parked) in std::mem::take(&mut self.pending) {
            attempts.insert(key, parked.attempts);
            batch.extend(parked.records);
        }
        batch.extend(fresh);
        if batch.is_empty() {
            return Ok((BatchReport::default(), read));
        }

        let report = self.indexer.process_batch(&batch).await;
        self.park_failures(&report, batch, &attempts);
        if report.is_success() {
            debug!(
                records = report.total(),
                checkpoint = ?self.checkpoint,
                "change batch indexed"
            );
        } else {
            warn!(
                failed = ?report.failed_sequences(),
                pending = self.pending_records(),
                checkpoint = ?self.checkpoint,
                "change batch partially failed"
            );
        }
        Ok((report, read))
    }

    fn park_failures(
        &mut self,
        report: &BatchReport,
        batch: Vec<ChangeRecord>,
        attempts: &BTreeMap<ItemKey, u32>,
    ) {
        let mut reasons: BTreeMap<u64, &FailureReason> = report
            .failed
            .iter()
            .map(|failed| (failed.sequence, &failed.reason))
            .collect();
        for record in batch {
            let Some(reason) = reasons.remove(&record.sequence) else {
                continue;
            };
            let parked = self
                .pending
                .entry(record.key.clone())
                .or_insert_with(|| PendingKey {
                    records: Vec::new(),
                    attempts: attempts.get(&record.key).map_or(1, |previous| previous + 1),
                    last_error: String::new(),
                });
            if let FailureReason::Error(message) = reason {
                parked.last_error.clone_from(message);
            }
            parked.records.push(record);
        }

        let exhausted: Vec<ItemKey> = self
            .pending
            .iter()
            .filter(|(_, parked)| parked.attempts >= self.max_attempts)
            .map(|(key, _)| key.clone())
            .collect();
        for key in exhausted {
            if let Some(parked) = self.pending.remove(&key) {
                warn!(
                    key = %key,
                    attempts = parked.attempts,
                    records = parked.records.len(),
                    error = %parked.last_error,
                    "change records dead-lettered"
                );
                let PendingKey {
                    records,
                    attempts: tries,
                    last_error,
                } = parked;
                self.dead_letters
                    .extend(records.into_iter().map(|record| DeadLetter {
                        record,
                        error: last_error.clone(),
                        attempts: tries,
                    }));
            }
        }
    }

    /// Polls until `shutdown` becomes `true` or its sender is dropped, and
    /// returns the [resume point](Self::resume_point).
    ///
    /// A full read is followed immediately by the next poll; otherwise the
    /// worker waits for the poll interval.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Option<u64> {
        info!(checkpoint = ?self.checkpoint, "change capture started");
        while !*shutdown.borrow() {
            let saturated = match self.poll().await {
                Ok((_, read)) => read >= self.batch_size,
                Err(err) => {
                    warn!(error = %err, "change feed read failed");
                    false
                }
            };
            if saturated {
                continue;
            }
            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(
            checkpoint = ?self.checkpoint,
            pending = self.pending_records(),
            dead_letters = self.dead_letters.len(),
            "change capture stopped"
        );
        self.resume_point()
    }
}

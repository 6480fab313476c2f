//! Applies store changes and domain events to the search index.

use crate::events::domain::EventEnvelope;
use crate::indexer::{
    domain::{
        BatchReport, DocumentTarget, FailedRecord, FailureReason, IndexOutcome, SearchDocument,
        SearchIndexName,
    },
    ports::{SearchIndex, SearchIndexError},
};
use crate::store::{
    domain::{ChangeKind, ChangeRecord, Entity, ItemKey},
    ports::{KeyedStore, StoreError},
};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while applying a single change.
#[derive(Debug, Clone, Error)]
pub enum IndexerError {
    /// The search index failed.
    #[error(transparent)]
    Index(#[from] SearchIndexError),

    /// Re-reading the entity failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The entity could not be encoded as a document.
    #[error("document encoding failed: {0}")]
    Encode(String),
}

/// Keeps the search index in step with the store.
///
/// Records of distinct keys are applied concurrently; records of one key
/// are applied in log order and stop at that key's first failure.
pub struct ChangeCaptureIndexer<I, S>
where
    I: SearchIndex,
    S: KeyedStore,
{
    index: Arc<I>,
    store: Arc<S>,
}

impl<I, S> Clone for ChangeCaptureIndexer<I, S>
where
    I: SearchIndex,
    S: KeyedStore,
{
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            store: Arc::clone(&self.store),
        }
    }
}

impl<I, S> ChangeCaptureIndexer<I, S>
where
    I: SearchIndex,
    S: KeyedStore,
{
    /// Creates a new indexer.
    #[must_use]
    pub const fn new(index: Arc<I>, store: Arc<S>) -> Self {
        Self { index, store }
    }

    /// Applies a batch of change records.
    ///
    /// Never fails as a whole: the report lists the failed record of each
    /// failing key together with the later records of that key that were
    /// held back.
    pub async fn process_batch(&self, records: &[ChangeRecord]) -> BatchReport {
        let mut by_key: BTreeMap<&ItemKey, Vec<&ChangeRecord>> = BTreeMap::new();
        for record in records {
            by_key.entry(&record.key).or_default().push(record);
        }

        let partials = join_all(by_key.into_values().map(|group| self.apply_key(group))).await;

        let mut report = BatchReport::default();
        for partial in partials {
            report.indexed += partial.indexed;
            report.deleted += partial.deleted;
            report.skipped += partial.skipped;
            report.failed.extend(partial.failed);
        }
        report.failed.sort_by_key(|failed| failed.sequence);
        debug!(
            records = records.len(),
            indexed = report.indexed,
            deleted = report.deleted,
            skipped = report.skipped,
            failed = report.failed.len(),
            "processed change batch"
        );
        report
    }

    /// Re-reads the task an event refers to and mirrors it into the index.
    ///
    /// A task that no longer exists is deleted from the index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError`] when the store read or index write fails.
    pub async fn handle_event(&self, envelope: &EventEnvelope) -> Result<IndexOutcome, IndexerError> {
        let task_id = envelope.event().task_id();
        let key = ItemKey::task(task_id);
        match self.store.get(&key).await? {
            Some(entity) => self.upsert(&entity).await,
            None => {
                let target = DocumentTarget {
                    index: SearchIndexName::Tasks,
                    id: task_id.to_string(),
                };
                self.index.delete(&target).await?;
                Ok(IndexOutcome::Deleted)
            }
        }
    }

    async fn apply_key(&self, group: Vec<&ChangeRecord>) -> BatchReport {
        let mut report = BatchReport::default();
        let mut pending = group.into_iter();
        while let Some(record) = pending.next() {
            match self.apply(record).await {
                Ok(outcome) => report.count(outcome),
                Err(err) => {
                    warn!(
                        sequence = record.sequence,
                        key = %record.key,
                        error = %err,
                        "change record not indexed"
                    );
                    report.failed.push(FailedRecord {
                        sequence: record.sequence,
                        key: record.key.clone(),
                        reason: FailureReason::Error(err.to_string()),
                    });
                    report.failed.extend(pending.map(|held| FailedRecord {
                        sequence: held.sequence,
                        key: held.key.clone(),
                        reason: FailureReason::HeldBack,
                    }));
                    break;
                }
            }
        }
        report
    }

    async fn apply(&self, record: &ChangeRecord) -> Result<IndexOutcome, IndexerError> {
        match record.kind {
            ChangeKind::Insert | ChangeKind::Modify => match &record.new_image {
                Some(entity) => self.upsert(entity).await,
                None => Ok(IndexOutcome::Skipped),
            },
            ChangeKind::Remove => {
                let Some(target) = record.old_image.as_ref().and_then(DocumentTarget::of) else {
                    return Ok(IndexOutcome::Skipped);
                };
                self.index.delete(&target).await?;
                Ok(IndexOutcome::Deleted)
            }
        }
    }

    async fn upsert(&self, entity: &Entity) -> Result<IndexOutcome, IndexerError> {
        let document = SearchDocument::from_entity(entity)
            .map_err(|err| IndexerError::Encode(err.to_string()))?;
        match document {
            Some(document) => {
                self.index.upsert(&document).await?;
                Ok(IndexOutcome::Indexed)
            }
            None => Ok(IndexOutcome::Skipped),
        }
    }
}

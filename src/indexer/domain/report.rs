//! Outcome of processing a change-log batch.

use crate::store::domain::ItemKey;

/// What happened to a single change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// A document was upserted.
    Indexed,
    /// A document was deleted.
    Deleted,
    /// The entity kind is not searchable.
    Skipped,
}

/// Why a record was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Applying this record failed.
    Error(String),
    /// An earlier record of the same key failed in this batch.
    HeldBack,
}

/// A record that was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    /// Log position of the record.
    pub sequence: u64,
    /// Item key of the record.
    pub key: ItemKey,
    /// Failure cause.
    pub reason: FailureReason,
}

/// Aggregate result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents upserted.
    pub indexed: usize,
    /// Documents deleted.
    pub deleted: usize,
    /// Records of non-searchable kinds.
    pub skipped: usize,
    /// Records not applied, ordered by sequence.
    pub failed: Vec<FailedRecord>,
}

impl BatchReport {
    /// Returns `true` when every record was applied or skipped.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the number of records the batch covered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.indexed + self.deleted + self.skipped + self.failed.len()
    }

    /// Returns the sequences of failed records.
    #[must_use]
    pub fn failed_sequences(&self) -> Vec<u64> {
        self.failed.iter().map(|record| record.sequence).collect()
    }

    /// Returns the lowest failed sequence, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<u64> {
        self.failed.iter().map(|record| record.sequence).min()
    }

    pub(crate) const fn count(&mut self, outcome: IndexOutcome) {
        match outcome {
            IndexOutcome::Indexed => self.indexed += 1,
            IndexOutcome::Deleted => self.deleted += 1,
            IndexOutcome::Skipped => self.skipped += 1,
        }
    }
}

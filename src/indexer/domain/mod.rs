//! Search documents and batch reports.

mod document;
mod report;

pub use document::{DocumentTarget, SearchDocument, SearchIndexName};
pub use report::{BatchReport, FailedRecord, FailureReason, IndexOutcome};

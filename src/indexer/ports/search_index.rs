//! Search index port.

use crate::indexer::domain::{DocumentTarget, SearchDocument};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for search index operations.
pub type SearchIndexResult<T> = Result<T, SearchIndexError>;

/// Errors returned by search index implementations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// The index refused the document.
    #[error("document {index}/{id} rejected: {reason}")]
    Rejected {
        /// Index name.
        index: String,
        /// Document id.
        id: String,
        /// Rejection reason.
        reason: String,
    },

    /// The index could not be reached.
    #[error("search index unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl SearchIndexError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

/// Document store for full-text search.
///
/// Both operations are idempotent: repeating an upsert leaves one document
/// and deleting an absent document succeeds.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Inserts or replaces a document.
    async fn upsert(&self, document: &SearchDocument) -> SearchIndexResult<()>;

    /// Removes a document.
    async fn delete(&self, target: &DocumentTarget) -> SearchIndexResult<()>;
}

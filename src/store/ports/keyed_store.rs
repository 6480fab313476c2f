//! Keyed store port.

use crate::store::domain::{
    ChangeRecord, Entity, EntityKind, IndexQuery, InvalidCursor, ItemKey, Page, PageRequest,
    WriteCondition,
};
use crate::task::domain::{Task, TaskChanges};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for keyed store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Single-item key/value store with conditional writes, secondary indexes,
/// and a change log.
///
/// Every operation is atomic for one item. There are no multi-item
/// transactions; conditional writes are the only concurrency primitive.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Reads one item.
    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Entity>>;

    /// Writes an item, replacing any existing one at the same key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConditionFailed`] when `condition` does not
    /// hold for the current item.
    async fn put(&self, entity: Entity, condition: Option<WriteCondition>) -> StoreResult<()>;

    /// Applies a change to a stored task and returns the updated task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the item is absent,
    /// [`StoreError::KindMismatch`] when it is not a task, or
    /// [`StoreError::ConditionFailed`] when `condition` does not hold.
    async fn update(
        &self,
        key: &ItemKey,
        changes: &TaskChanges,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Task>;

    /// Deletes an item and returns it, or `None` if it was absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConditionFailed`] when `condition` does not
    /// hold for the current item.
    async fn delete(
        &self,
        key: &ItemKey,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Option<Entity>>;

    /// Reads one page of an index partition in index order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCursor`] when the page cursor was not
    /// produced by this store.
    async fn query(&self, query: &IndexQuery, page: &PageRequest) -> StoreResult<Page<Entity>>;

    /// Reads every page of an index partition.
    ///
    /// # Errors
    ///
    /// Propagates the first failing page read.
    async fn query_all(&self, query: &IndexQuery) -> StoreResult<Vec<Entity>> {
        let mut items = Vec::new();
        let mut request = PageRequest::default();
        loop {
            let page = self.query(query, &request).await?;
            items.extend(page.items);
            match page.next {
                Some(cursor) => request = PageRequest::default().after(cursor),
                None => return Ok(items),
            }
        }
    }
}

/// Reader over the store's change log.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Returns up to `limit` records with a sequence greater than `after`,
    /// in sequence order.
    async fn read_since(&self, after: Option<u64>, limit: usize) -> StoreResult<Vec<ChangeRecord>>;
}

/// Errors returned by keyed store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A write condition did not hold.
    #[error("condition failed for {0}")]
    ConditionFailed(ItemKey),

    /// The item does not exist.
    #[error("item not found: {0}")]
    NotFound(ItemKey),

    /// The item exists but holds a different kind of entity.
    #[error("item {key} holds a {found}, expected a {expected}")]
    KindMismatch {
        /// Item key.
        key: ItemKey,
        /// Kind the operation requires.
        expected: EntityKind,
        /// Kind actually stored.
        found: EntityKind,
    },

    /// A page cursor could not be decoded.
    #[error(transparent)]
    InvalidCursor(#[from] InvalidCursor),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The store is temporarily unreachable; the operation may be retried.
    #[error("store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// Permanent persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a transient failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Wraps a permanent persistence failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` when retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

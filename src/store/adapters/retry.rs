//! Store decorator retrying transient failures with exponential backoff.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;

use crate::store::{
    domain::{ChangeRecord, Entity, IndexQuery, ItemKey, Page, PageRequest, WriteCondition},
    ports::{ChangeFeed, KeyedStore, StoreError, StoreResult},
};
use crate::task::domain::{Task, TaskChanges};

/// Backoff settings for [`RetryingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// First backoff delay.
    pub min_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_retries: 0,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn backoff(self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Wraps a store and retries [`StoreError::Unavailable`] failures.
///
/// Condition failures, missing items, and permanent errors are returned
/// immediately.
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    /// Wraps `inner` with the given policy.
    #[must_use]
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

fn log_retry(operation: &'static str) -> impl Fn(&StoreError, Duration) {
    move |err, delay| {
        tracing::warn!(
            operation,
            error = %err,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retrying store operation"
        );
    }
}

#[async_trait]
impl<S> KeyedStore for RetryingStore<S>
where
    S: KeyedStore,
{
    async fn get(&self, key: &ItemKey) -> StoreResult<Option<Entity>> {
        (|| self.inner.get(key))
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(log_retry("get"))
            .await
    }

    async fn put(&self, entity: Entity, condition: Option<WriteCondition>) -> StoreResult<()> {
        (|| self.inner.put(entity.clone(), condition))
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(log_retry("put"))
            .await
    }

    async fn update(
        &self,
        key: &ItemKey,
        changes: &TaskChanges,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Task> {
        (|| self.inner.update(key, changes, condition))
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(log_retry("update"))
            .await
    }

    async fn delete(
        &self,
        key: &ItemKey,
        condition: Option<WriteCondition>,
    ) -> StoreResult<Option<Entity>> {
        (|| self.inner.delete(key, condition))
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(log_retry("delete"))
            .await
    }

    async fn query(&self, query: &IndexQuery, page: &PageRequest) -> StoreResult<Page<Entity>> {
        (|| self.inner.query(query, page))
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(log_retry("query"))
            .await
    }
}

#[async_trait]
impl<S> ChangeFeed for RetryingStore<S>
where
    S: ChangeFeed,
{
    async fn read_since(&self, after: Option<u64>, limit: usize) -> StoreResult<Vec<ChangeRecord>> {
        (|| self.inner.read_since(after, limit))
            .retry(self.policy.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(log_retry("read_since"))
            .await
    }
}

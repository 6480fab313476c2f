//! Index queries and restartable pagination.

use super::key::{
    IndexName, ItemKey, project_partition, sprint_partition, status_partition, user_partition,
};
use crate::identity::domain::UserId;
use crate::task::domain::{ProjectId, SprintId, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// A query over one partition of one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    index: IndexName,
    partition: String,
    sort_prefix: Option<String>,
}

impl IndexQuery {
    /// Every item stored under a task's partition.
    #[must_use]
    pub fn task_partition(task_id: &TaskId) -> Self {
        Self::new(IndexName::Primary, ItemKey::task_partition(task_id))
    }

    /// Assignments of a task.
    #[must_use]
    pub fn assignments_of(task_id: &TaskId) -> Self {
        Self::task_partition(task_id).with_sort_prefix("ASSIGNMENT#")
    }

    /// Comments on a task, oldest first.
    #[must_use]
    pub fn comments_on(task_id: &TaskId) -> Self {
        Self::task_partition(task_id).with_sort_prefix("COMMENT#")
    }

    /// Tasks with the given status, oldest first.
    #[must_use]
    pub fn by_status(status: TaskStatus) -> Self {
        Self::new(IndexName::Status, status_partition(status))
    }

    /// Assignments held by a user.
    #[must_use]
    pub fn by_assignee(user_id: &UserId) -> Self {
        Self::new(IndexName::Assignee, user_partition(user_id))
    }

    /// Tasks in a sprint.
    #[must_use]
    pub fn by_sprint(sprint_id: SprintId) -> Self {
        Self::new(IndexName::Sprint, sprint_partition(sprint_id))
    }

    /// Tasks in a project, oldest first.
    #[must_use]
    pub fn tasks_in_project(project_id: ProjectId) -> Self {
        Self::new(IndexName::Project, project_partition(project_id)).with_sort_prefix("CREATED_AT#")
    }

    fn new(index: IndexName, partition: String) -> Self {
        Self {
            index,
            partition,
            sort_prefix: None,
        }
    }

    /// Restricts the query to index sort keys starting with `prefix`.
    #[must_use]
    pub fn with_sort_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sort_prefix = Some(prefix.into());
        self
    }

    /// Returns the index being queried.
    #[must_use]
    pub const fn index(&self) -> IndexName {
        self.index
    }

    /// Returns the index partition.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Returns the sort-key prefix, if any.
    #[must_use]
    pub fn sort_prefix(&self) -> Option<&str> {
        self.sort_prefix.as_deref()
    }
}

/// Opaque continuation token returned with a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

/// Error returned for a cursor that was not produced by the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid pagination cursor")]
pub struct InvalidCursor;

/// Decoded cursor: the index sort key and primary key of the last item
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Index sort key.
    #[serde(rename = "s")]
    pub sort: String,
    /// Primary partition key.
    #[serde(rename = "pk")]
    pub partition_key: String,
    /// Primary sort key.
    #[serde(rename = "sk")]
    pub sort_key: String,
}

impl CursorPosition {
    /// Returns the primary key recorded in the position.
    #[must_use]
    pub fn item_key(&self) -> ItemKey {
        ItemKey::from_parts(self.partition_key.clone(), self.sort_key.clone())
    }
}

impl Cursor {
    /// Encodes a position into a token.
    #[must_use]
    pub fn encode(position: &CursorPosition) -> Self {
        let json = serde_json::to_vec(position).unwrap_or_default();
        Self(hex::encode(json))
    }

    /// Wraps a token received from a caller.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the token.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCursor`] when the token is not valid hex-encoded
    /// position JSON.
    pub fn decode(&self) -> Result<CursorPosition, InvalidCursor> {
        let bytes = hex::decode(&self.0).map_err(|_| InvalidCursor)?;
        serde_json::from_slice(&bytes).map_err(|_| InvalidCursor)
    }
}

/// Page size and continuation point for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    limit: usize,
    start_after: Option<Cursor>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_LIMIT)
    }
}

impl PageRequest {
    /// Requests the first page. A zero limit is raised to one.
    #[must_use]
    pub fn first(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            start_after: None,
        }
    }

    /// Continues after `cursor`.
    #[must_use]
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    /// Continues after `cursor` when present.
    #[must_use]
    pub fn resume(self, cursor: Option<Cursor>) -> Self {
        match cursor {
            Some(token) => self.after(token),
            None => self,
        }
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the continuation cursor, if any.
    #[must_use]
    pub const fn start_after(&self) -> Option<&Cursor> {
        self.start_after.as_ref()
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in index order.
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last page.
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    /// Maps the items, keeping the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }
}

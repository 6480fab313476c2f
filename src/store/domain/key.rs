//! Primary keys and secondary-index names.

use crate::identity::domain::UserId;
use crate::task::domain::{AttachmentId, Comment, ProjectId, SprintId, TaskId, TaskStatus};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

const METADATA_SORT: &str = "METADATA";

/// Composite primary key of a stored item.
///
/// Keys are only built from typed identifiers, so callers can never address
/// an item with a hand-written key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    partition: String,
    sort: String,
}

impl ItemKey {
    /// Key of a task's metadata item.
    #[must_use]
    pub fn task(id: &TaskId) -> Self {
        Self::from_parts(Self::task_partition(id), METADATA_SORT.to_owned())
    }

    /// Key of the assignment of `user_id` to a task.
    #[must_use]
    pub fn assignment(task_id: &TaskId, user_id: &UserId) -> Self {
        Self::from_parts(Self::task_partition(task_id), format!("ASSIGNMENT#{user_id}"))
    }

    /// Key of a comment. Comments sort by creation time within their task.
    #[must_use]
    pub fn comment(comment: &Comment) -> Self {
        Self::from_parts(
            Self::task_partition(comment.task_id()),
            format!(
                "COMMENT#{}#{}",
                comment
                    .created_at()
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
                comment.id()
            ),
        )
    }

    /// Key of an attachment.
    #[must_use]
    pub fn attachment(task_id: &TaskId, attachment_id: AttachmentId) -> Self {
        Self::from_parts(
            Self::task_partition(task_id),
            format!("ATTACHMENT#{attachment_id}"),
        )
    }

    /// Key of a project.
    #[must_use]
    pub fn project(id: ProjectId) -> Self {
        Self::from_parts(format!("PROJECT#{id}"), METADATA_SORT.to_owned())
    }

    /// Key of a sprint.
    #[must_use]
    pub fn sprint(id: SprintId) -> Self {
        Self::from_parts(format!("SPRINT#{id}"), METADATA_SORT.to_owned())
    }

    /// Partition holding a task and every record hanging off it.
    #[must_use]
    pub fn task_partition(id: &TaskId) -> String {
        format!("TASK#{id}")
    }

    /// Rebuilds a key read back from persistence or a cursor.
    pub(crate) const fn from_parts(partition: String, sort: String) -> Self {
        Self { partition, sort }
    }

    /// Returns the partition key.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Returns the sort key.
    #[must_use]
    pub fn sort(&self) -> &str {
        &self.sort
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

/// Named access paths over stored items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexName {
    /// Items grouped by partition key, ordered by sort key.
    Primary,
    /// Tasks by status, ordered by creation time.
    Status,
    /// Assignments by assignee.
    Assignee,
    /// Tasks by sprint.
    Sprint,
    /// Tasks and sprints by project.
    Project,
}

impl IndexName {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Status => "status",
            Self::Assignee => "assignee",
            Self::Sprint => "sprint",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an item within a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEntry {
    /// Index partition key.
    pub partition: String,
    /// Index sort key.
    pub sort: String,
}

pub(crate) fn status_partition(status: TaskStatus) -> String {
    format!("STATUS#{}", status.as_str())
}

pub(crate) fn user_partition(user_id: &UserId) -> String {
    format!("USER#{user_id}")
}

pub(crate) fn sprint_partition(sprint_id: SprintId) -> String {
    format!("SPRINT#{sprint_id}")
}

pub(crate) fn project_partition(project_id: ProjectId) -> String {
    format!("PROJECT#{project_id}")
}

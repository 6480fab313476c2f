//! Domain events and their payloads.

use crate::identity::domain::UserId;
use crate::task::domain::{CommentId, Priority, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Payload of [`DomainEvent::TaskCreated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreated {
    /// Created task.
    pub task_id: TaskId,
    /// Task title.
    pub title: String,
    /// Creating administrator.
    pub created_by: UserId,
    /// Initial priority.
    pub priority: Priority,
}

/// Payload of [`DomainEvent::TaskUpdated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdated {
    /// Updated task.
    pub task_id: TaskId,
    /// Title after the update.
    pub title: String,
    /// Updating administrator.
    pub updated_by: UserId,
    /// Names of the fields the patch set.
    pub changed_fields: Vec<String>,
}

/// Payload of [`DomainEvent::TaskStatusUpdated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdated {
    /// Updated task.
    pub task_id: TaskId,
    /// Task title.
    pub task_title: String,
    /// Status before the update.
    pub previous_status: TaskStatus,
    /// Status after the update.
    pub new_status: TaskStatus,
    /// Actor who changed the status.
    pub updated_by: UserId,
}

/// Payload of [`DomainEvent::TaskAssigned`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssigned {
    /// Assigned task.
    pub task_id: TaskId,
    /// Task title.
    pub task_title: String,
    /// New assignee.
    pub assigned_to: UserId,
    /// Assigning administrator.
    pub assigned_by: UserId,
    /// Task priority.
    pub priority: Priority,
}

/// Payload of [`DomainEvent::TaskClosed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskClosed {
    /// Closed task.
    pub task_id: TaskId,
    /// Task title.
    pub task_title: String,
    /// Closing administrator.
    pub closed_by: UserId,
    /// Status the task held when it was closed.
    pub final_status: TaskStatus,
}

/// Payload of [`DomainEvent::CommentAdded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    /// Commented task.
    pub task_id: TaskId,
    /// New comment.
    pub comment_id: CommentId,
    /// Comment author.
    pub author_id: UserId,
    /// Mentioned users.
    #[serde(default)]
    pub mentions: Vec<UserId>,
}

/// Payload of [`DomainEvent::TaskUpdatedFromExternalTrigger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatedFromExternalTrigger {
    /// Updated task.
    pub task_id: TaskId,
    /// Repository activity, for example `push` or `opened`.
    pub action: String,
    /// Pull request number, if the activity was a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    /// Pull request URL, if the activity was a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    /// Commit hash, if the activity was a push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

/// Payload of [`DomainEvent::TaskPrApproved`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPrApproved {
    /// Referenced task.
    pub task_id: TaskId,
    /// Approved pull request.
    pub pr_number: u64,
    /// Approving reviewer login.
    pub reviewer: String,
}

/// Event emitted after a committed mutation.
///
/// Serialized adjacently tagged: `{"detailType": "...", "detail": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "detailType", content = "detail")]
pub enum DomainEvent {
    /// A task was created.
    TaskCreated(TaskCreated),
    /// Task metadata changed.
    TaskUpdated(TaskUpdated),
    /// Task status changed.
    TaskStatusUpdated(TaskStatusUpdated),
    /// A user was assigned to a task.
    TaskAssigned(TaskAssigned),
    /// A task was closed.
    TaskClosed(TaskClosed),
    /// A comment was added.
    CommentAdded(CommentAdded),
    /// Repository activity updated a task.
    TaskUpdatedFromExternalTrigger(TaskUpdatedFromExternalTrigger),
    /// A pull request referencing a task was approved.
    #[serde(rename = "TaskPRApproved")]
    TaskPrApproved(TaskPrApproved),
}

/// Error returned when an event payload is incomplete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{event} event has an empty {field}")]
pub struct EventValidationError {
    /// Event type.
    pub event: &'static str,
    /// Offending field.
    pub field: &'static str,
}

impl DomainEvent {
    /// Returns the event type name used on the bus.
    #[must_use]
    pub const fn detail_type(&self) -> &'static str {
        match self {
            Self::TaskCreated(_) => "TaskCreated",
            Self::TaskUpdated(_) => "TaskUpdated",
            Self::TaskStatusUpdated(_) => "TaskStatusUpdated",
            Self::TaskAssigned(_) => "TaskAssigned",
            Self::TaskClosed(_) => "TaskClosed",
            Self::CommentAdded(_) => "CommentAdded",
            Self::TaskUpdatedFromExternalTrigger(_) => "TaskUpdatedFromExternalTrigger",
            Self::TaskPrApproved(_) => "TaskPRApproved",
        }
    }

    /// Returns the task the event concerns.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::TaskCreated(payload) => &payload.task_id,
            Self::TaskUpdated(payload) => &payload.task_id,
            Self::TaskStatusUpdated(payload) => &payload.task_id,
            Self::TaskAssigned(payload) => &payload.task_id,
            Self::TaskClosed(payload) => &payload.task_id,
            Self::CommentAdded(payload) => &payload.task_id,
            Self::TaskUpdatedFromExternalTrigger(payload) => &payload.task_id,
            Self::TaskPrApproved(payload) => &payload.task_id,
        }
    }

    /// Checks that required text fields are non-empty.
    ///
    /// Identifiers are validated by their constructors; this covers the
    /// free-text fields.
    ///
    /// # Errors
    ///
    /// Returns [`EventValidationError`] naming the first empty field.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        let required: &[(&'static str, &str)] = match self {
            Self::TaskCreated(payload) => &[("title", payload.title.as_str())],
            Self::TaskUpdated(payload) => &[("title", payload.title.as_str())],
            Self::TaskStatusUpdated(payload) => &[("taskTitle", payload.task_title.as_str())],
            Self::TaskAssigned(payload) => &[("taskTitle", payload.task_title.as_str())],
            Self::TaskClosed(payload) => &[("taskTitle", payload.task_title.as_str())],
            Self::CommentAdded(_) => &[],
            Self::TaskUpdatedFromExternalTrigger(payload) => &[("action", payload.action.as_str())],
            Self::TaskPrApproved(payload) => &[("reviewer", payload.reviewer.as_str())],
        };
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(EventValidationError {
                event: self.detail_type(),
                field,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.detail_type(), self.task_id())
    }
}

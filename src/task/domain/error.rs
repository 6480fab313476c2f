//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or changing task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is empty or contains a key separator.
    #[error("invalid task identifier '{0}'")]
    InvalidTaskId(String),

    /// The task title is empty after trimming.
    #[error("Title is required")]
    EmptyTitle,

    /// `CLOSED` was requested through a status update.
    #[error("tasks are closed through the close operation, not a status update")]
    CloseThroughStatusUpdate,

    /// The comment body is empty after trimming.
    #[error("comment content must not be empty")]
    EmptyComment,

    /// The project key or name is empty after trimming.
    #[error("project {0} must not be empty")]
    EmptyProjectField(&'static str),

    /// The sprint name is empty after trimming.
    #[error("sprint name must not be empty")]
    EmptySprintName,

    /// The sprint ends before it starts.
    #[error("sprint end date precedes its start date")]
    InvertedSprintDates,

    /// The attachment content type is not on the allow list.
    #[error("file type not allowed: {0}")]
    AttachmentTypeNotAllowed(String),

    /// The attachment exceeds the size limit.
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    AttachmentTooLarge {
        /// Object size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },
}

/// Error returned while parsing a task status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a task priority.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid priority: {0}")]
pub struct ParsePriorityError(pub String);

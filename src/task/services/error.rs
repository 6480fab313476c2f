//! Service-level errors for task operations.

use crate::error::{ApiError, ErrorKind};
use crate::identity::{domain::UserId, ports::DirectoryError};
use crate::store::{domain::ItemKey, ports::StoreError};
use crate::task::domain::{ParseTaskStatusError, TaskDomainError, TaskId};
use thiserror::Error;

/// Errors returned by task services.
#[derive(Debug, Clone, Error)]
pub enum TaskServiceError {
    /// The actor's role or assignment does not permit the operation.
    #[error("{0}")]
    PermissionDenied(&'static str),

    /// The task does not exist.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The assignee is unknown or deactivated.
    #[error("User not found or inactive: {0}")]
    UnknownUser(UserId),

    /// The task is closed and accepts no further status changes.
    #[error("Task {0} is closed")]
    TaskClosed(TaskId),

    /// The user already holds an assignment on the task.
    #[error("User {user_id} is already assigned to task {task_id}")]
    AlreadyAssigned {
        /// Task identifier.
        task_id: TaskId,
        /// Assignee identifier.
        user_id: UserId,
    },

    /// A conditional write lost a race.
    #[error("conflicting write on {0}")]
    Conflict(ItemKey),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The requested status is not a known status.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The user directory failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl TaskServiceError {
    /// Returns the transport error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::UnknownUser(_)
            | Self::TaskClosed(_)
            | Self::Domain(_)
            | Self::InvalidStatus(_) => ErrorKind::ValidationError,
            Self::AlreadyAssigned { .. } | Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(err) => match err {
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::ConditionFailed(_) => ErrorKind::Conflict,
                StoreError::InvalidCursor(_) => ErrorKind::ValidationError,
                StoreError::KindMismatch { .. }
                | StoreError::Corrupt(_)
                | StoreError::Unavailable(_)
                | StoreError::Persistence(_) => ErrorKind::Internal,
            },
            Self::Directory(_) => ErrorKind::Internal,
        }
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

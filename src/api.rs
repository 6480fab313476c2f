//! Request and response bodies for the HTTP surface.
//!
//! Routing lives outside this crate; these types fix the JSON shapes and
//! convert them into service inputs. Conversion failures are returned as
//! [`ApiError`] values with a 400 status.

use crate::error::{ApiError, ErrorKind};
use crate::identity::domain::UserId;
use crate::store::domain::{Cursor, DEFAULT_PAGE_LIMIT, Page, PageRequest};
use crate::task::domain::{
    Priority, ProjectId, SprintId, Task, TaskDraft, TaskPatch, TaskStatus,
};
use crate::task::services::TaskFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    /// Task title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority; defaults to `MEDIUM`.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Owning sprint.
    #[serde(default)]
    pub sprint_id: Option<SprintId>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Story-point estimate.
    #[serde(default)]
    pub estimated_points: Option<u32>,
    /// Labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl CreateTaskBody {
    /// Converts the body into a task draft.
    #[must_use]
    pub fn into_draft(self) -> TaskDraft {
        let mut draft = TaskDraft::new(self.title)
            .with_priority(self.priority.unwrap_or_default())
            .with_labels(self.labels);
        if let Some(description) = self.description {
            draft = draft.with_description(description);
        }
        if let Some(project_id) = self.project_id {
            draft = draft.with_project(project_id);
        }
        if let Some(sprint_id) = self.sprint_id {
            draft = draft.with_sprint(sprint_id);
        }
        if let Some(due_date) = self.due_date {
            draft = draft.with_due_date(due_date);
        }
        if let Some(points) = self.estimated_points {
            draft = draft.with_estimated_points(points);
        }
        draft
    }
}

/// Body of `PUT /tasks/{id}`.
pub type UpdateTaskBody = TaskPatch;

/// Body of `PUT /tasks/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateStatusBody {
    /// Requested status name.
    pub status: String,
}

/// Body of `POST /tasks/{id}/assign`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    /// User to assign.
    pub user_id: String,
}

impl AssignBody {
    /// Validates the assignee identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation [`ApiError`] for a blank identifier.
    pub fn assignee(&self) -> Result<UserId, ApiError> {
        UserId::new(self.user_id.as_str())
            .map_err(|err| ApiError::new(ErrorKind::ValidationError, err.to_string()))
    }
}

/// Body of `POST /tasks/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddCommentBody {
    /// Comment text.
    pub content: String,
    /// Mentioned users.
    #[serde(default)]
    pub mentions: Vec<UserId>,
}

/// Query string of `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    /// Restrict to a sprint.
    #[serde(default)]
    pub sprint_id: Option<SprintId>,
    /// Restrict to a status.
    #[serde(default)]
    pub status: Option<String>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Cursor returned by the previous page.
    #[serde(default)]
    pub next_token: Option<String>,
}

impl ListTasksQuery {
    /// Returns the listing filter. A sprint takes precedence over a status.
    ///
    /// # Errors
    ///
    /// Returns a validation [`ApiError`] for an unknown status.
    pub fn filter(&self) -> Result<TaskFilter, ApiError> {
        if let Some(sprint_id) = self.sprint_id {
            return Ok(TaskFilter::Sprint(sprint_id));
        }
        match self.status.as_deref() {
            Some(raw) => TaskStatus::try_from(raw)
                .map(TaskFilter::Status)
                .map_err(|err| ApiError::new(ErrorKind::ValidationError, err.to_string())),
            None => Ok(TaskFilter::Default),
        }
    }

    /// Returns the page request.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        PageRequest::first(self.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
            .resume(self.next_token.clone().map(Cursor::from_token))
    }
}

/// Response of `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    /// Tasks on this page.
    pub tasks: Vec<Task>,
    /// Cursor for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl From<Page<Task>> for TaskListResponse {
    fn from(page: Page<Task>) -> Self {
        Self {
            tasks: page.items,
            next_token: page.next.map(|cursor| cursor.as_str().to_owned()),
        }
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Acknowledgement for `DELETE /tasks/{id}`.
    #[must_use]
    pub fn task_deleted() -> Self {
        Self {
            message: "Task deleted successfully".to_owned(),
        }
    }
}

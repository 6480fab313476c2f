//! Task aggregate root and the changes that may be applied to it.

use super::{Priority, ProjectId, SprintId, TaskDomainError, TaskId, TaskStatus};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    title: String,
    description: Option<String>,
    priority: Priority,
    project_id: Option<ProjectId>,
    sprint_id: Option<SprintId>,
    due_date: Option<DateTime<Utc>>,
    estimated_points: Option<u32>,
    labels: Vec<String>,
}

impl TaskDraft {
    /// Creates a draft with the given title and default priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Places the task in a project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Places the task in a sprint.
    #[must_use]
    pub const fn with_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the estimate in story points.
    #[must_use]
    pub const fn with_estimated_points(mut self, points: u32) -> Self {
        self.estimated_points = Some(points);
        self
    }

    /// Sets the labels.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Returns the title as supplied.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// State of a pull request linked to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    /// Open and under review.
    Open,
    /// Merged into its base branch.
    Merged,
    /// Closed without merging.
    Closed,
}

/// Most recent commit that referenced a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Commit hash.
    pub sha: String,
    /// Commit message.
    pub message: String,
    /// Author display name.
    pub author: String,
    /// Web URL of the commit.
    pub url: String,
    /// Branch the commit was pushed to.
    pub branch: String,
    /// Repository full name.
    pub repository: String,
}

/// Repository linkage metadata recorded from external activity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryLink {
    /// Branch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Pull request web URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    /// Pull request number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    /// Pull request state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_status: Option<PullRequestState>,
    /// Latest referencing commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<CommitInfo>,
}

impl RepositoryLink {
    /// Returns `true` when no linkage field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.git_branch.is_none()
            && self.pr_url.is_none()
            && self.pr_number.is_none()
            && self.pr_status.is_none()
            && self.last_commit.is_none()
    }
}

/// Partial metadata update. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// New project.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// New sprint.
    #[serde(default)]
    pub sprint_id: Option<SprintId>,
    /// New due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// New estimate.
    #[serde(default)]
    pub estimated_points: Option<u32>,
    /// Replacement labels.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

impl TaskPatch {
    /// Returns the wire names of the fields this patch sets.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("priority", self.priority.is_some()),
            ("projectId", self.project_id.is_some()),
            ("sprintId", self.sprint_id.is_some()),
            ("dueDate", self.due_date.is_some()),
            ("estimatedPoints", self.estimated_points.is_some()),
            ("labels", self.labels.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// The kind of change carried by [`TaskChanges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// Merge metadata fields.
    Metadata(TaskPatch),
    /// Move to a non-terminal status.
    Status(TaskStatus),
    /// Close the task.
    Close,
    /// Record repository linkage.
    RepositoryLink(RepositoryLink),
}

/// A validated change to a task, stamped with who made it and when.
///
/// Only the constructors below produce values, so a status change can never
/// target `Closed` and a metadata change can never blank the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    change: TaskChange,
    changed_by: UserId,
    changed_at: DateTime<Utc>,
}

impl TaskChanges {
    /// Builds a metadata change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the patch sets a blank
    /// title.
    pub fn metadata(
        mut patch: TaskPatch,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        if let Some(title) = patch.title.take() {
            patch.title = Some(normalize_title(&title)?);
        }
        Ok(Self {
            change: TaskChange::Metadata(patch),
            changed_by,
            changed_at,
        })
    }

    /// Builds a status change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::CloseThroughStatusUpdate`] when `status`
    /// is `Closed`.
    pub fn status(
        status: TaskStatus,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        if status.is_terminal() {
            return Err(TaskDomainError::CloseThroughStatusUpdate);
        }
        Ok(Self {
            change: TaskChange::Status(status),
            changed_by,
            changed_at,
        })
    }

    /// Builds a close change.
    #[must_use]
    pub const fn close(changed_by: UserId, changed_at: DateTime<Utc>) -> Self {
        Self {
            change: TaskChange::Close,
            changed_by,
            changed_at,
        }
    }

    /// Builds a repository linkage change.
    #[must_use]
    pub const fn repository_link(
        link: RepositoryLink,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            change: TaskChange::RepositoryLink(link),
            changed_by,
            changed_at,
        }
    }

    /// Returns the change kind.
    #[must_use]
    pub const fn change(&self) -> &TaskChange {
        &self.change
    }

    /// Returns who made the change.
    #[must_use]
    pub const fn changed_by(&self) -> &UserId {
        &self.changed_by
    }

    /// Returns when the change was made.
    #[must_use]
    pub const fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "taskId")]
    id: TaskId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    priority: Priority,
    status: TaskStatus,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sprint_id: Option<SprintId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_points: Option<u32>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pr_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pr_status: Option<PullRequestState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_commit: Option<CommitInfo>,
}

impl Task {
    /// Creates a new `OPEN` task with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn create(
        draft: TaskDraft,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        Self::create_with_id(TaskId::generate(), draft, created_by, clock)
    }

    /// Creates a new `OPEN` task with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn create_with_id(
        id: TaskId,
        draft: TaskDraft,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = normalize_title(&draft.title)?;
        let timestamp = clock.utc();
        Ok(Self {
            id,
            title,
            description: draft.description,
            priority: draft.priority,
            status: TaskStatus::Open,
            created_by,
            created_at: timestamp,
            updated_at: timestamp,
            updated_by: None,
            closed_by: None,
            closed_at: None,
            project_id: draft.project_id,
            sprint_id: draft.sprint_id,
            due_date: draft.due_date,
            estimated_points: draft.estimated_points,
            labels: draft.labels,
            git_branch: None,
            pr_url: None,
            pr_number: None,
            pr_status: None,
            last_commit: None,
        })
    }

    /// Applies a validated change and stamps the update audit fields.
    pub fn apply_changes(&mut self, changes: &TaskChanges) {
        match &changes.change {
            TaskChange::Metadata(patch) => self.merge_patch(patch),
            TaskChange::Status(status) => self.status = *status,
            TaskChange::Close => {
                self.status = TaskStatus::Closed;
                self.closed_by = Some(changes.changed_by.clone());
                self.closed_at = Some(changes.changed_at);
            }
            TaskChange::RepositoryLink(link) => self.merge_link(link),
        }
        self.updated_by = Some(changes.changed_by.clone());
        self.updated_at = changes.changed_at;
    }

    fn merge_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if patch.description.is_some() {
            self.description.clone_from(&patch.description);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if patch.project_id.is_some() {
            self.project_id = patch.project_id;
        }
        if patch.sprint_id.is_some() {
            self.sprint_id = patch.sprint_id;
        }
        if patch.due_date.is_some() {
            self.due_date = patch.due_date;
        }
        if patch.estimated_points.is_some() {
            self.estimated_points = patch.estimated_points;
        }
        if let Some(labels) = &patch.labels {
            self.labels.clone_from(labels);
        }
    }

    fn merge_link(&mut self, link: &RepositoryLink) {
        if link.git_branch.is_some() {
            self.git_branch.clone_from(&link.git_branch);
        }
        if link.pr_url.is_some() {
            self.pr_url.clone_from(&link.pr_url);
        }
        if link.pr_number.is_some() {
            self.pr_number = link.pr_number;
        }
        if link.pr_status.is_some() {
            self.pr_status = link.pr_status;
        }
        if link.last_commit.is_some() {
            self.last_commit.clone_from(&link.last_commit);
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> &UserId {
        &self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns who last updated the task, if anyone has.
    #[must_use]
    pub const fn updated_by(&self) -> Option<&UserId> {
        self.updated_by.as_ref()
    }

    /// Returns who closed the task.
    #[must_use]
    pub const fn closed_by(&self) -> Option<&UserId> {
        self.closed_by.as_ref()
    }

    /// Returns when the task was closed.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns the project, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the sprint, if any.
    #[must_use]
    pub const fn sprint_id(&self) -> Option<SprintId> {
        self.sprint_id
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the estimate, if any.
    #[must_use]
    pub const fn estimated_points(&self) -> Option<u32> {
        self.estimated_points
    }

    /// Returns the labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the linked branch, if any.
    #[must_use]
    pub fn git_branch(&self) -> Option<&str> {
        self.git_branch.as_deref()
    }

    /// Returns the linked pull request URL, if any.
    #[must_use]
    pub fn pr_url(&self) -> Option<&str> {
        self.pr_url.as_deref()
    }

    /// Returns the linked pull request number, if any.
    #[must_use]
    pub const fn pr_number(&self) -> Option<u64> {
        self.pr_number
    }

    /// Returns the linked pull request state, if any.
    #[must_use]
    pub const fn pr_status(&self) -> Option<PullRequestState> {
        self.pr_status
    }

    /// Returns the latest referencing commit, if any.
    #[must_use]
    pub const fn last_commit(&self) -> Option<&CommitInfo> {
        self.last_commit.as_ref()
    }
}

fn normalize_title(title: &str) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

//! Projects and sprints that group tasks.

use super::{ProjectId, SprintId, TaskDomainError};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Accepting work.
    #[default]
    Active,
    /// Read-only.
    Archived,
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    key: String,
    name: String,
    description: Option<String>,
    lead_id: Option<UserId>,
}

impl ProjectDraft {
    /// Creates a draft with a short key (for example `CORE`) and a name.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            lead_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the project lead.
    #[must_use]
    pub fn with_lead(mut self, lead_id: UserId) -> Self {
        self.lead_id = Some(lead_id);
        self
    }
}

/// A project grouping related tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "projectId")]
    id: ProjectId,
    key: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lead_id: Option<UserId>,
    status: ProjectStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates an active project. The key is upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyProjectField`] when the key or name is
    /// blank.
    pub fn create(draft: ProjectDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let key = draft.key.trim().to_ascii_uppercase();
        if key.is_empty() {
            return Err(TaskDomainError::EmptyProjectField("key"));
        }
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(TaskDomainError::EmptyProjectField("name"));
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: ProjectId::new(),
            key,
            name: name.to_owned(),
            description: draft.description,
            lead_id: draft.lead_id,
            status: ProjectStatus::Active,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the short key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lead, if any.
    #[must_use]
    pub const fn lead_id(&self) -> Option<&UserId> {
        self.lead_id.as_ref()
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
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
}

/// Sprint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    /// Not started.
    #[default]
    Planned,
    /// Running.
    Active,
    /// Finished.
    Completed,
}

/// Input for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintDraft {
    name: String,
    project_id: Option<ProjectId>,
    goal: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl SprintDraft {
    /// Creates a draft with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: None,
            goal: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Places the sprint in a project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Sets the sprint goal.
    #[must_use]
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    /// Sets the planned start and end.
    #[must_use]
    pub const fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

/// A time-boxed iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    #[serde(rename = "sprintId")]
    id: SprintId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    status: SprintStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a planned sprint.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySprintName`] when the name is blank
    /// and [`TaskDomainError::InvertedSprintDates`] when it ends before it
    /// starts.
    pub fn create(draft: SprintDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(TaskDomainError::EmptySprintName);
        }
        let inverted = matches!(
            (draft.start_date, draft.end_date),
            (Some(start), Some(end)) if end < start
        );
        if inverted {
            return Err(TaskDomainError::InvertedSprintDates);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: SprintId::new(),
            project_id: draft.project_id,
            name: name.to_owned(),
            goal: draft.goal,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: SprintStatus::Planned,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the sprint identifier.
    #[must_use]
    pub const fn id(&self) -> SprintId {
        self.id
    }

    /// Returns the project, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the goal, if any.
    #[must_use]
    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    /// Returns the planned start, if any.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the planned end, if any.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> SprintStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

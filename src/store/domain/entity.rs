//! Typed records held by the keyed store.

use super::key::{
    IndexEntry, IndexName, ItemKey, project_partition, sprint_partition, status_partition,
    user_partition,
};
use crate::task::domain::{Assignment, Attachment, Comment, Project, Sprint, Task};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// [`Task`] metadata item.
    Task,
    /// [`Assignment`] item.
    Assignment,
    /// [`Comment`] item.
    Comment,
    /// [`Attachment`] item.
    Attachment,
    /// [`Project`] item.
    Project,
    /// [`Sprint`] item.
    Sprint,
}

impl EntityKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Assignment => "ASSIGNMENT",
            Self::Comment => "COMMENT",
            Self::Attachment => "ATTACHMENT",
            Self::Project => "PROJECT",
            Self::Sprint => "SPRINT",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record held by the store.
///
/// The primary key and every index entry are derived from the record
/// itself, so an index can never disagree with the attribute it reflects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entityType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Entity {
    /// Task metadata.
    Task(Task),
    /// Task assignment.
    Assignment(Assignment),
    /// Task comment.
    Comment(Comment),
    /// Task attachment.
    Attachment(Attachment),
    /// Project.
    Project(Project),
    /// Sprint.
    Sprint(Sprint),
}

impl Entity {
    /// Returns the primary key.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        match self {
            Self::Task(task) => ItemKey::task(task.id()),
            Self::Assignment(assignment) => {
                ItemKey::assignment(assignment.task_id(), assignment.user_id())
            }
            Self::Comment(comment) => ItemKey::comment(comment),
            Self::Attachment(attachment) => {
                ItemKey::attachment(attachment.task_id(), attachment.id())
            }
            Self::Project(project) => ItemKey::project(project.id()),
            Self::Sprint(sprint) => ItemKey::sprint(sprint.id()),
        }
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Task(_) => EntityKind::Task,
            Self::Assignment(_) => EntityKind::Assignment,
            Self::Comment(_) => EntityKind::Comment,
            Self::Attachment(_) => EntityKind::Attachment,
            Self::Project(_) => EntityKind::Project,
            Self::Sprint(_) => EntityKind::Sprint,
        }
    }

    /// Returns this entity's position in `index`, if it appears there.
    #[must_use]
    pub fn index_entry(&self, index: IndexName) -> Option<IndexEntry> {
        match (index, self) {
            (IndexName::Primary, _) => {
                let key = self.key();
                Some(IndexEntry {
                    partition: key.partition().to_owned(),
                    sort: key.sort().to_owned(),
                })
            }
            (IndexName::Status, Self::Task(task)) => Some(IndexEntry {
                partition: status_partition(task.status()),
                sort: created_at_sort(task),
            }),
            (IndexName::Assignee, Self::Assignment(assignment)) => Some(IndexEntry {
                partition: user_partition(assignment.user_id()),
                sort: format!("TASK#{}", assignment.task_id()),
            }),
            (IndexName::Sprint, Self::Task(task)) => task.sprint_id().map(|sprint_id| IndexEntry {
                partition: sprint_partition(sprint_id),
                sort: format!("TASK#{}", task.id()),
            }),
            (IndexName::Project, Self::Task(task)) => {
                task.project_id().map(|project_id| IndexEntry {
                    partition: project_partition(project_id),
                    sort: created_at_sort(task),
                })
            }
            (IndexName::Project, Self::Sprint(sprint)) => {
                sprint.project_id().map(|project_id| IndexEntry {
                    partition: project_partition(project_id),
                    sort: format!("SPRINT#{}", sprint.id()),
                })
            }
            _ => None,
        }
    }

    /// Returns every index position of this entity, primary included.
    #[must_use]
    pub fn index_entries(&self) -> Vec<(IndexName, IndexEntry)> {
        [
            IndexName::Primary,
            IndexName::Status,
            IndexName::Assignee,
            IndexName::Sprint,
            IndexName::Project,
        ]
        .into_iter()
        .filter_map(|index| self.index_entry(index).map(|entry| (index, entry)))
        .collect()
    }

    /// Returns the task, if this is a task item.
    #[must_use]
    pub const fn as_task(&self) -> Option<&Task> {
        match self {
            Self::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Converts into a task, if this is a task item.
    #[must_use]
    pub fn into_task(self) -> Option<Task> {
        match self {
            Self::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Converts into an assignment, if this is an assignment item.
    #[must_use]
    pub fn into_assignment(self) -> Option<Assignment> {
        match self {
            Self::Assignment(assignment) => Some(assignment),
            _ => None,
        }
    }

    /// Converts into an attachment, if this is an attachment item.
    #[must_use]
    pub fn into_attachment(self) -> Option<Attachment> {
        match self {
            Self::Attachment(attachment) => Some(attachment),
            _ => None,
        }
    }

    /// Converts into a comment, if this is a comment item.
    #[must_use]
    pub fn into_comment(self) -> Option<Comment> {
        match self {
            Self::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    /// Converts into a project, if this is a project item.
    #[must_use]
    pub fn into_project(self) -> Option<Project> {
        match self {
            Self::Project(project) => Some(project),
            _ => None,
        }
    }

    /// Converts into a sprint, if this is a sprint item.
    #[must_use]
    pub fn into_sprint(self) -> Option<Sprint> {
        match self {
            Self::Sprint(sprint) => Some(sprint),
            _ => None,
        }
    }
}

fn created_at_sort(task: &Task) -> String {
    format!(
        "CREATED_AT#{}#{}",
        task.created_at().to_rfc3339_opts(SecondsFormat::Micros, true),
        task.id()
    )
}

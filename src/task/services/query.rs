//! Read-side task queries.

use super::{
    TaskServiceError, TaskServiceResult,
    lookup::{assignees_of, load_task},
};
use crate::identity::domain::{Actor, UserId};
use crate::store::{
    domain::{Entity, IndexQuery, Page, PageRequest},
    ports::KeyedStore,
};
use crate::task::domain::{SprintId, Task, TaskId, TaskStatus};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;

/// A task together with the users assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// The task record.
    #[serde(flatten)]
    pub task: Task,
    /// Current assignees.
    pub assignees: Vec<UserId>,
}

/// Listing filter for [`TaskQueryService::list_tasks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Tasks in a sprint.
    Sprint(SprintId),
    /// Tasks with a status.
    Status(TaskStatus),
    /// Open tasks for admins; assigned tasks for members.
    #[default]
    Default,
}

/// Read-side task service.
#[derive(Clone)]
pub struct TaskQueryService<S>
where
    S: KeyedStore,
{
    store: Arc<S>,
}

impl<S> TaskQueryService<S>
where
    S: KeyedStore,
{
    /// Creates a new query service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns a task with its assignees.
    ///
    /// Members may only read tasks they are assigned to.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is absent
    /// and [`TaskServiceError::PermissionDenied`] when a member is not
    /// assigned.
    pub async fn get_task(&self, task_id: &TaskId, actor: &Actor) -> TaskServiceResult<TaskView> {
        let task = load_task(&*self.store, task_id).await?;
        let assignees = assignees_of(&*self.store, task_id).await?;
        if !actor.is_admin() && !assignees.contains(actor.user_id()) {
            return Err(TaskServiceError::PermissionDenied(
                "You can only view tasks assigned to you",
            ));
        }
        Ok(TaskView { task, assignees })
    }

    /// Lists one page of tasks.
    ///
    /// # Errors
    ///
    /// Returns store failures, including invalid cursors.
    pub async fn list_tasks(
        &self,
        filter: TaskFilter,
        page: &PageRequest,
        actor: &Actor,
    ) -> TaskServiceResult<Page<Task>> {
        let query = match filter {
            TaskFilter::Sprint(sprint_id) => IndexQuery::by_sprint(sprint_id),
            TaskFilter::Status(status) => IndexQuery::by_status(status),
            TaskFilter::Default if actor.is_admin() => IndexQuery::by_status(TaskStatus::Open),
            TaskFilter::Default => return self.assigned_page(actor.user_id(), page).await,
        };
        let found = self.store.query(&query, page).await?;
        Ok(Page {
            items: found.items.into_iter().filter_map(Entity::into_task).collect(),
            next: found.next,
        })
    }

    /// Lists every task assigned to the actor, oldest first.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn my_tasks(
        &self,
        actor: &Actor,
        status: Option<TaskStatus>,
    ) -> TaskServiceResult<Vec<Task>> {
        let rows = self
            .store
            .query_all(&IndexQuery::by_assignee(actor.user_id()))
            .await?;
        let mut tasks = self.resolve_assigned(rows).await?;
        tasks.retain(|task| status.is_none_or(|wanted| task.status() == wanted));
        tasks.sort_by_key(Task::created_at);
        Ok(tasks)
    }

    async fn assigned_page(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> TaskServiceResult<Page<Task>> {
        let rows = self
            .store
            .query(&IndexQuery::by_assignee(user_id), page)
            .await?;
        let items = self.resolve_assigned(rows.items).await?;
        Ok(Page {
            items,
            next: rows.next,
        })
    }

    /// Loads the tasks behind assignment rows, skipping rows whose task
    /// has been deleted.
    async fn resolve_assigned(&self, rows: Vec<Entity>) -> TaskServiceResult<Vec<Task>> {
        let lookups = rows
            .into_iter()
            .filter_map(Entity::into_assignment)
            .map(|assignment| async move {
                match load_task(&*self.store, assignment.task_id()).await {
                    Ok(task) => Ok(Some(task)),
                    Err(TaskServiceError::TaskNotFound(_)) => Ok(None),
                    Err(err) => Err(err),
                }
            });
        let tasks = try_join_all(lookups).await?;
        Ok(tasks.into_iter().flatten().collect())
    }
}

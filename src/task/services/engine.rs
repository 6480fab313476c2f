//! Task mutation engine.

use super::{
    TaskServiceError, TaskServiceResult,
    lookup::{is_assigned, load_task},
};
use crate::events::{
    domain::{
        DomainEvent, TASK_SERVICE_SOURCE, TaskAssigned, TaskClosed, TaskCreated,
        TaskStatusUpdated, TaskUpdated, TaskUpdatedFromExternalTrigger,
    },
    ports::EventBus,
    services::EventPublisher,
};
use crate::identity::{
    domain::{Actor, UserId},
    ports::UserDirectory,
};
use crate::store::{
    domain::{Entity, ItemKey, WriteCondition},
    ports::{KeyedStore, StoreError},
};
use crate::task::domain::{
    Assignment, RepositoryLink, Task, TaskChanges, TaskDraft, TaskId, TaskPatch, TaskStatus,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Orchestrates every write to a task.
///
/// Each operation checks the actor's role or assignment, performs exactly
/// one conditional store write, and publishes the matching event once the
/// write has committed. Store contention surfaces as
/// [`TaskServiceError::Conflict`] and is never retried here.
pub struct TaskMutationEngine<S, B, D, C>
where
    S: KeyedStore,
    B: EventBus,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    publisher: EventPublisher<B>,
    directory: Arc<D>,
    clock: Arc<C>,
}

impl<S, B, D, C> Clone for TaskMutationEngine<S, B, D, C>
where
    S: KeyedStore,
    B: EventBus,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: self.publisher.clone(),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, B, D, C> TaskMutationEngine<S, B, D, C>
where
    S: KeyedStore,
    B: EventBus,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new mutation engine.
    #[must_use]
    pub fn new(store: Arc<S>, bus: Arc<B>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            store,
            publisher: EventPublisher::new(bus, TASK_SERVICE_SOURCE),
            directory,
            clock,
        }
    }

    /// Tags events published by this engine with `source` instead of the
    /// task service's own source.
    #[must_use]
    pub fn with_event_source(self, source: impl Into<String>) -> Self {
        Self {
            publisher: self.publisher.with_source(source),
            ..self
        }
    }

    /// Creates an `OPEN` task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors,
    /// [`TaskServiceError::Domain`] for a blank title, and store failures.
    pub async fn create_task(&self, draft: TaskDraft, actor: &Actor) -> TaskServiceResult<Task> {
        require_admin(actor, "Only admins can create tasks")?;
        let task = Task::create(draft, actor.user_id().clone(), &*self.clock)?;
        self.store
            .put(Entity::Task(task.clone()), Some(WriteCondition::NotExists))
            .await
            .map_err(conflict_on_condition)?;
        info!(task_id = %task.id(), created_by = %actor.user_id(), "task created");

        self.publisher
            .publish_committed(
                DomainEvent::TaskCreated(TaskCreated {
                    task_id: task.id().clone(),
                    title: task.title().to_owned(),
                    created_by: actor.user_id().clone(),
                    priority: task.priority(),
                }),
                task.created_at(),
            )
            .await;
        Ok(task)
    }

    /// Merges metadata fields into a task. Status is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors,
    /// [`TaskServiceError::TaskNotFound`] when the task is absent, and
    /// [`TaskServiceError::Domain`] when the patch blanks the title.
    pub async fn update_task(
        &self,
        task_id: &TaskId,
        patch: TaskPatch,
        actor: &Actor,
    ) -> TaskServiceResult<Task> {
        require_admin(actor, "Only admins can update tasks")?;
        let changed_fields: Vec<String> = patch
            .field_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let changes = TaskChanges::metadata(patch, actor.user_id().clone(), self.clock.utc())?;
        let updated = self
            .store
            .update(&ItemKey::task(task_id), &changes, None)
            .await
            .map_err(|err| not_found_as_task(err, task_id))?;
        info!(task_id = %task_id, fields = ?changed_fields, "task updated");

        self.publisher
            .publish_committed(
                DomainEvent::TaskUpdated(TaskUpdated {
                    task_id: task_id.clone(),
                    title: updated.title().to_owned(),
                    updated_by: actor.user_id().clone(),
                    changed_fields,
                }),
                changes.changed_at(),
            )
            .await;
        Ok(updated)
    }

    /// Moves a task to a new non-terminal status.
    ///
    /// Admins may update any task; members only tasks they are assigned to.
    /// Concurrent updates are last-write-wins; the write is guarded only by
    /// the task existing and not being closed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::InvalidStatus`] for unknown status
    /// names, [`TaskServiceError::PermissionDenied`] for unassigned
    /// members, [`TaskServiceError::TaskNotFound`] when the task is absent,
    /// [`TaskServiceError::TaskClosed`] when it is closed, and
    /// [`TaskServiceError::Domain`] when `CLOSED` is requested.
    pub async fn update_status(
        &self,
        task_id: &TaskId,
        new_status: &str,
        actor: &Actor,
    ) -> TaskServiceResult<Task> {
        let status = TaskStatus::try_from(new_status)?;
        if !actor.is_admin() && !is_assigned(&*self.store, task_id, actor.user_id()).await? {
            return Err(TaskServiceError::PermissionDenied(
                "You can only update status of tasks assigned to you",
            ));
        }
        let current = load_task(&*self.store, task_id).await?;
        if current.status().is_terminal() {
            return Err(TaskServiceError::TaskClosed(task_id.clone()));
        }
        let changes = TaskChanges::status(status, actor.user_id().clone(), self.clock.utc())?;
        let updated = self
            .store
            .update(
                &ItemKey::task(task_id),
                &changes,
                Some(WriteCondition::TaskStatusIsNot(TaskStatus::Closed)),
            )
            .await
            .map_err(|err| closed_on_condition(err, task_id))?;
        info!(
            task_id = %task_id,
            previous = %current.status(),
            new = %status,
            "task status updated"
        );

        self.publisher
            .publish_committed(
                DomainEvent::TaskStatusUpdated(TaskStatusUpdated {
                    task_id: task_id.clone(),
                    task_title: updated.title().to_owned(),
                    previous_status: current.status(),
                    new_status: status,
                    updated_by: actor.user_id().clone(),
                }),
                changes.changed_at(),
            )
            .await;
        Ok(updated)
    }

    /// Assigns an active user to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors,
    /// [`TaskServiceError::TaskNotFound`] when the task is absent,
    /// [`TaskServiceError::UnknownUser`] when the assignee is absent or
    /// deactivated, and [`TaskServiceError::AlreadyAssigned`] when the
    /// assignment already exists.
    pub async fn assign(
        &self,
        task_id: &TaskId,
        user_id: &UserId,
        actor: &Actor,
    ) -> TaskServiceResult<Assignment> {
        require_admin(actor, "Only admins can assign tasks")?;
        let task = load_task(&*self.store, task_id).await?;
        let assignee = self.directory.find_user(user_id).await?;
        if !assignee.is_some_and(|profile| profile.is_active()) {
            return Err(TaskServiceError::UnknownUser(user_id.clone()));
        }

        let assignment = Assignment::new(
            task_id.clone(),
            user_id.clone(),
            actor.user_id().clone(),
            &*self.clock,
        );
        self.store
            .put(
                Entity::Assignment(assignment.clone()),
                Some(WriteCondition::NotExists),
            )
            .await
            .map_err(|err| match err {
                StoreError::ConditionFailed(_) => TaskServiceError::AlreadyAssigned {
                    task_id: task_id.clone(),
                    user_id: user_id.clone(),
                },
                other => other.into(),
            })?;
        info!(task_id = %task_id, assignee = %user_id, "task assigned");

        self.publisher
            .publish_committed(
                DomainEvent::TaskAssigned(TaskAssigned {
                    task_id: task_id.clone(),
                    task_title: task.title().to_owned(),
                    assigned_to: user_id.clone(),
                    assigned_by: actor.user_id().clone(),
                    priority: task.priority(),
                }),
                assignment.assigned_at(),
            )
            .await;
        Ok(assignment)
    }

    /// Closes a task. `CLOSED` is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors,
    /// [`TaskServiceError::TaskNotFound`] when the task is absent, and
    /// [`TaskServiceError::TaskClosed`] when it is already closed.
    pub async fn close(&self, task_id: &TaskId, actor: &Actor) -> TaskServiceResult<Task> {
        require_admin(actor, "Only admins can close tasks")?;
        let current = load_task(&*self.store, task_id).await?;
        if current.status().is_terminal() {
            return Err(TaskServiceError::TaskClosed(task_id.clone()));
        }
        let changes = TaskChanges::close(actor.user_id().clone(), self.clock.utc());
        let closed = self
            .store
            .update(
                &ItemKey::task(task_id),
                &changes,
                Some(WriteCondition::TaskStatusIsNot(TaskStatus::Closed)),
            )
            .await
            .map_err(|err| closed_on_condition(err, task_id))?;
        info!(task_id = %task_id, final_status = %current.status(), "task closed");

        self.publisher
            .publish_committed(
                DomainEvent::TaskClosed(TaskClosed {
                    task_id: task_id.clone(),
                    task_title: closed.title().to_owned(),
                    closed_by: actor.user_id().clone(),
                    final_status: current.status(),
                }),
                changes.changed_at(),
            )
            .await;
        Ok(closed)
    }

    /// Deletes a task's metadata item.
    ///
    /// Assignments, comments, and attachments stored under the task are
    /// left in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors
    /// and [`TaskServiceError::TaskNotFound`] when the task is absent.
    pub async fn delete_task(&self, task_id: &TaskId, actor: &Actor) -> TaskServiceResult<Task> {
        require_admin(actor, "Only admins can delete tasks")?;
        let removed = self.store.delete(&ItemKey::task(task_id), None).await?;
        match removed {
            Some(Entity::Task(task)) => {
                info!(task_id = %task_id, deleted_by = %actor.user_id(), "task deleted");
                Ok(task)
            }
            Some(other) => Err(StoreError::Corrupt(format!(
                "task key {} held a {} item",
                ItemKey::task(task_id),
                other.kind().as_str()
            ))
            .into()),
            None => Err(TaskServiceError::TaskNotFound(task_id.clone())),
        }
    }

    /// Records repository linkage on a task without changing its status.
    ///
    /// `action` names the repository activity and is carried on the
    /// published event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors
    /// and [`TaskServiceError::TaskNotFound`] when the task is absent.
    pub async fn record_repository_link(
        &self,
        task_id: &TaskId,
        link: RepositoryLink,
        action: &str,
        actor: &Actor,
    ) -> TaskServiceResult<Task> {
        require_admin(actor, "Only admins can link repository activity")?;
        let pr_number = link.pr_number;
        let pr_url = link.pr_url.clone();
        let commit_sha = link.last_commit.as_ref().map(|commit| commit.sha.clone());
        let changes =
            TaskChanges::repository_link(link, actor.user_id().clone(), self.clock.utc());
        let updated = self
            .store
            .update(&ItemKey::task(task_id), &changes, None)
            .await
            .map_err(|err| not_found_as_task(err, task_id))?;
        info!(task_id = %task_id, action, "repository link recorded");

        self.publisher
            .publish_committed(
                DomainEvent::TaskUpdatedFromExternalTrigger(TaskUpdatedFromExternalTrigger {
                    task_id: task_id.clone(),
                    action: action.to_owned(),
                    pr_number,
                    pr_url,
                    commit_sha,
                }),
                changes.changed_at(),
            )
            .await;
        Ok(updated)
    }
}

const fn require_admin(actor: &Actor, message: &'static str) -> TaskServiceResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(TaskServiceError::PermissionDenied(message))
    }
}

fn conflict_on_condition(err: StoreError) -> TaskServiceError {
    match err {
        StoreError::ConditionFailed(key) => TaskServiceError::Conflict(key),
        other => other.into(),
    }
}

fn not_found_as_task(err: StoreError, task_id: &TaskId) -> TaskServiceError {
    match err {
        StoreError::NotFound(_) => TaskServiceError::TaskNotFound(task_id.clone()),
        other => other.into(),
    }
}

fn closed_on_condition(err: StoreError, task_id: &TaskId) -> TaskServiceError {
    match err {
        StoreError::ConditionFailed(_) => TaskServiceError::TaskClosed(task_id.clone()),
        other => not_found_as_task(other, task_id),
    }
}

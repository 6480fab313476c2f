//! Project and sprint administration.

use super::{TaskServiceError, TaskServiceResult};
use crate::identity::domain::Actor;
use crate::store::{
    domain::{Entity, WriteCondition},
    ports::KeyedStore,
};
use crate::task::domain::{Project, ProjectDraft, Sprint, SprintDraft};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Creates projects and sprints.
#[derive(Clone)]
pub struct ProjectService<S, C>
where
    S: KeyedStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> ProjectService<S, C>
where
    S: KeyedStore,
    C: Clock + Send + Sync,
{
    /// Creates a new project service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors,
    /// [`TaskServiceError::Domain`] for blank keys or names, and store
    /// failures.
    pub async fn create_project(
        &self,
        draft: ProjectDraft,
        actor: &Actor,
    ) -> TaskServiceResult<Project> {
        if !actor.is_admin() {
            return Err(TaskServiceError::PermissionDenied(
                "Only admins can create projects",
            ));
        }
        let project = Project::create(draft, &*self.clock)?;
        self.store
            .put(
                Entity::Project(project.clone()),
                Some(WriteCondition::NotExists),
            )
            .await?;
        info!(project_id = %project.id(), key = project.key(), "project created");
        Ok(project)
    }

    /// Creates a sprint.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for non-admin actors,
    /// [`TaskServiceError::Domain`] for a blank name or inverted dates, and
    /// store failures.
    pub async fn create_sprint(&self, draft: SprintDraft, actor: &Actor) -> TaskServiceResult<Sprint> {
        if !actor.is_admin() {
            return Err(TaskServiceError::PermissionDenied(
                "Only admins can create sprints",
            ));
        }
        let sprint = Sprint::create(draft, &*self.clock)?;
        self.store
            .put(
                Entity::Sprint(sprint.clone()),
                Some(WriteCondition::NotExists),
            )
            .await?;
        info!(sprint_id = %sprint.id(), name = sprint.name(), "sprint created");
        Ok(sprint)
    }
}

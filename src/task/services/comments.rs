//! Comment threads on tasks.

use super::{
    TaskServiceError, TaskServiceResult,
    lookup::{is_assigned, load_task},
};
use crate::events::{
    domain::{CommentAdded, DomainEvent, TASK_SERVICE_SOURCE},
    ports::EventBus,
    services::EventPublisher,
};
use crate::identity::domain::{Actor, UserId};
use crate::store::{
    domain::{Entity, IndexQuery, WriteCondition},
    ports::KeyedStore,
};
use crate::task::domain::{Comment, TaskId};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Appends and lists task comments.
///
/// Admins may comment on any task; members only on tasks they are
/// assigned to.
pub struct CommentService<S, B, C>
where
    S: KeyedStore,
    B: EventBus,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    publisher: EventPublisher<B>,
    clock: Arc<C>,
}

impl<S, B, C> CommentService<S, B, C>
where
    S: KeyedStore,
    B: EventBus,
    C: Clock + Send + Sync,
{
    /// Creates a new comment service.
    #[must_use]
    pub fn new(store: Arc<S>, bus: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            store,
            publisher: EventPublisher::new(bus, TASK_SERVICE_SOURCE),
            clock,
        }
    }

    /// Appends a comment to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task is absent,
    /// [`TaskServiceError::PermissionDenied`] when a member is not
    /// assigned, and [`TaskServiceError::Domain`] for blank content.
    pub async fn add_comment(
        &self,
        task_id: &TaskId,
        content: &str,
        mentions: Vec<UserId>,
        actor: &Actor,
    ) -> TaskServiceResult<Comment> {
        load_task(&*self.store, task_id).await?;
        self.authorize(task_id, actor).await?;
        let comment = Comment::new(
            task_id.clone(),
            actor.user_id().clone(),
            content,
            mentions,
            &*self.clock,
        )?;
        self.store
            .put(
                Entity::Comment(comment.clone()),
                Some(WriteCondition::NotExists),
            )
            .await?;
        info!(task_id = %task_id, comment_id = %comment.id(), "comment added");

        self.publisher
            .publish_committed(
                DomainEvent::CommentAdded(CommentAdded {
                    task_id: task_id.clone(),
                    comment_id: comment.id(),
                    author_id: actor.user_id().clone(),
                    mentions: comment.mentions().to_vec(),
                }),
                comment.created_at(),
            )
            .await;
        Ok(comment)
    }

    /// Lists a task's comments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] when a member is not
    /// assigned, and store failures.
    pub async fn list_comments(
        &self,
        task_id: &TaskId,
        actor: &Actor,
    ) -> TaskServiceResult<Vec<Comment>> {
        self.authorize(task_id, actor).await?;
        let rows = self.store.query_all(&IndexQuery::comments_on(task_id)).await?;
        Ok(rows.into_iter().filter_map(Entity::into_comment).collect())
    }

    async fn authorize(&self, task_id: &TaskId, actor: &Actor) -> TaskServiceResult<()> {
        if actor.is_admin() || is_assigned(&*self.store, task_id, actor.user_id()).await? {
            Ok(())
        } else {
            Err(TaskServiceError::PermissionDenied(
                "You can only comment on tasks assigned to you",
            ))
        }
    }
}

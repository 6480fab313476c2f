//! Store reads shared by the task services.

use super::{TaskServiceError, TaskServiceResult};
use crate::identity::domain::UserId;
use crate::store::{
    domain::{Entity, EntityKind, IndexQuery, ItemKey},
    ports::{KeyedStore, StoreError},
};
use crate::task::domain::{Task, TaskId};

pub(super) async fn load_task<S>(store: &S, task_id: &TaskId) -> TaskServiceResult<Task>
where
    S: KeyedStore,
{
    let key = ItemKey::task(task_id);
    match store.get(&key).await? {
        Some(Entity::Task(task)) => Ok(task),
        Some(other) => Err(StoreError::KindMismatch {
            key,
            expected: EntityKind::Task,
            found: other.kind(),
        }
        .into()),
        None => Err(TaskServiceError::TaskNotFound(task_id.clone())),
    }
}

pub(super) async fn is_assigned<S>(
    store: &S,
    task_id: &TaskId,
    user_id: &UserId,
) -> TaskServiceResult<bool>
where
    S: KeyedStore,
{
    let row = store.get(&ItemKey::assignment(task_id, user_id)).await?;
    Ok(row.is_some())
}

pub(super) async fn assignees_of<S>(store: &S, task_id: &TaskId) -> TaskServiceResult<Vec<UserId>>
where
    S: KeyedStore,
{
    let rows = store.query_all(&IndexQuery::assignments_of(task_id)).await?;
    Ok(rows
        .into_iter()
        .filter_map(Entity::into_assignment)
        .map(|assignment| assignment.user_id().clone())
        .collect())
}

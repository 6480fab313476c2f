//! Conditional-write predicates.

use super::Entity;
use crate::task::domain::TaskStatus;

/// Predicate evaluated against the current item, atomically with a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    /// The item must exist.
    Exists,
    /// The item must not exist.
    NotExists,
    /// The item must be a task whose status differs from the given one.
    TaskStatusIsNot(TaskStatus),
}

impl WriteCondition {
    /// Evaluates the predicate against the current item.
    #[must_use]
    pub fn holds(self, current: Option<&Entity>) -> bool {
        match self {
            Self::Exists => current.is_some(),
            Self::NotExists => current.is_none(),
            Self::TaskStatusIsNot(status) => current
                .and_then(Entity::as_task)
                .is_some_and(|task| task.status() != status),
        }
    }
}

//! Event payloads and envelopes.

mod envelope;
mod event;

pub use envelope::{EventEnvelope, REPOSITORY_TRIGGER_SOURCE, TASK_SERVICE_SOURCE};
pub use event::{
    CommentAdded, DomainEvent, EventValidationError, TaskAssigned, TaskClosed, TaskCreated,
    TaskPrApproved, TaskStatusUpdated, TaskUpdated, TaskUpdatedFromExternalTrigger,
};

//! Domain model for tasks and the records that hang off them.
//!
//! Tasks move through a small status state machine with `CLOSED` as the
//! only terminal state. Every mutation is expressed as a validated
//! [`TaskChanges`] value so persistence adapters can apply it without
//! re-checking business rules.

mod collaboration;
mod error;
mod ids;
mod project;
mod status;
mod task;

pub use collaboration::{Assignment, Attachment, AttachmentPolicy, Comment, UploadedObject};
pub use error::{ParsePriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::{AttachmentId, CommentId, ProjectId, SprintId, TaskId};
pub use project::{Project, ProjectDraft, ProjectStatus, Sprint, SprintDraft, SprintStatus};
pub use status::{Priority, TaskStatus};
pub use task::{
    CommitInfo, PullRequestState, RepositoryLink, Task, TaskChange, TaskChanges, TaskDraft,
    TaskPatch,
};

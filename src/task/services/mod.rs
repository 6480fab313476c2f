//! Task services: mutations, queries, and collaboration.

mod attachments;
mod comments;
mod engine;
mod error;
mod lookup;
mod projects;
mod query;

pub use attachments::{AttachmentRecorder, ObjectCreated};
pub use comments::CommentService;
pub use engine::TaskMutationEngine;
pub use error::{TaskServiceError, TaskServiceResult};
pub use projects::ProjectService;
pub use query::{TaskFilter, TaskQueryService, TaskView};

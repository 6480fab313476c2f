//! Webhook payloads, signatures, and the reference policy.

mod payload;
mod references;
mod signature;

pub use payload::{
    Account, CommitAuthor, HeadRef, PullRequest, PullRequestEvent, PullRequestReviewEvent,
    PushCommit, PushEvent, Repository, RepositoryEvent, Review,
};
pub use references::{extract_task_refs, status_from_keywords};
pub use signature::{SIGNATURE_HEADER, SignatureError, WebhookVerifier};

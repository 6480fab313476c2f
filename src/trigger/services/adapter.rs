//! Repository webhook handling.

use crate::error::{ApiError, ErrorKind};
use crate::events::{
    domain::{DomainEvent, REPOSITORY_TRIGGER_SOURCE, TaskPrApproved},
    ports::EventBus,
    services::EventPublisher,
};
use crate::identity::{domain::Actor, ports::UserDirectory};
use crate::store::ports::KeyedStore;
use crate::task::{
    domain::{CommitInfo, RepositoryLink, TaskId, TaskStatus},
    services::{TaskMutationEngine, TaskServiceError},
};
use crate::trigger::domain::{
    PullRequest, PullRequestEvent, PullRequestReviewEvent, PushEvent, RepositoryEvent,
    SignatureError, WebhookVerifier, extract_task_refs, status_from_keywords,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the system actor repository activity is attributed to.
pub const REPOSITORY_ACTOR: &str = "repository";

/// Errors that reject a webhook delivery as a whole.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The signature did not verify.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The body of a handled event could not be decoded.
    #[error("invalid webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl TriggerError {
    /// Returns the transport category for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Signature(_) => ErrorKind::Unauthorized,
            Self::Payload(_) => ErrorKind::ValidationError,
        }
    }
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        let message = match &err {
            TriggerError::Signature(_) => "Invalid signature".to_owned(),
            TriggerError::Payload(_) => err.to_string(),
        };
        Self::new(err.kind(), message)
    }
}

/// A referenced task whose update failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFailure {
    /// Referenced task.
    pub task_id: TaskId,
    /// Category of the failure.
    pub kind: ErrorKind,
    /// Failure description.
    pub message: String,
}

/// Outcome of one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriggerReport {
    /// Webhook event name.
    pub event: String,
    /// Tasks updated at least once, in first-touched order.
    pub updated: Vec<TaskId>,
    /// Per-task failures.
    pub failures: Vec<TriggerFailure>,
    /// `true` when the event type is not handled.
    pub ignored: bool,
}

impl TriggerReport {
    fn new(event: &str) -> Self {
        Self {
            event: event.to_owned(),
            ..Self::default()
        }
    }

    fn ignored(event: &str) -> Self {
        Self {
            ignored: true,
            ..Self::new(event)
        }
    }

    fn touched(&mut self, task_id: &TaskId) {
        if !self.updated.contains(task_id) {
            self.updated.push(task_id.clone());
        }
    }

    fn failed(&mut self, task_id: &TaskId, kind: ErrorKind, message: String) {
        warn!(task_id = %task_id, %kind, error = %message, "repository trigger update failed");
        self.failures.push(TriggerFailure {
            task_id: task_id.clone(),
            kind,
            message,
        });
    }
}

/// Applies repository activity to tasks.
///
/// Every delivery is authenticated against the shared secret before its
/// body is parsed. Writes go through the mutation engine as the
/// admin-equivalent system actor; events are tagged with the repository
/// source.
pub struct ExternalTriggerAdapter<S, B, D, C>
where
    S: KeyedStore,
    B: EventBus,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    engine: TaskMutationEngine<S, B, D, C>,
    publisher: EventPublisher<B>,
    clock: Arc<C>,
    verifier: WebhookVerifier,
    actor: Actor,
}

impl<S, B, D, C> ExternalTriggerAdapter<S, B, D, C>
where
    S: KeyedStore,
    B: EventBus,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    /// Creates an adapter writing through its own mutation engine.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        bus: Arc<B>,
        directory: Arc<D>,
        clock: Arc<C>,
        verifier: WebhookVerifier,
    ) -> Self {
        let engine = TaskMutationEngine::new(store, Arc::clone(&bus), directory, Arc::clone(&clock))
            .with_event_source(REPOSITORY_TRIGGER_SOURCE);
        Self {
            engine,
            publisher: EventPublisher::new(bus, REPOSITORY_TRIGGER_SOURCE),
            clock,
            verifier,
            actor: Actor::system(REPOSITORY_ACTOR),
        }
    }

    /// Returns the actor repository writes are attributed to.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Authenticates and applies one webhook delivery.
    ///
    /// Unknown event names are acknowledged with an ignored report. Each
    /// referenced task is updated independently; failures are collected in
    /// the report rather than returned.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Signature`] when the signature is missing or
    /// wrong and [`TriggerError::Payload`] when a handled event's body does
    /// not decode.
    pub async fn handle(
        &self,
        event_name: &str,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<TriggerReport, TriggerError> {
        self.verifier.verify(signature, body)?;
        let Some(event) = RepositoryEvent::decode(event_name, body)? else {
            debug!(event = event_name, "ignoring unhandled repository event");
            return Ok(TriggerReport::ignored(event_name));
        };

        let mut report = TriggerReport::new(event_name);
        match event {
            RepositoryEvent::Push(push) => self.on_push(&push, &mut report).await,
            RepositoryEvent::PullRequest(pull) => self.on_pull_request(&pull, &mut report).await,
            RepositoryEvent::PullRequestReview(review) => {
                self.on_review(&review, &mut report).await;
            }
        }
        info!(
            event = event_name,
            updated = report.updated.len(),
            failed = report.failures.len(),
            "repository event applied"
        );
        Ok(report)
    }

    async fn on_push(&self, push: &PushEvent, report: &mut TriggerReport) {
        let branch = push.branch();
        for commit in &push.commits {
            let refs = extract_task_refs(&commit.message);
            if refs.is_empty() {
                continue;
            }
            let link = RepositoryLink {
                git_branch: Some(branch.to_owned()),
                last_commit: Some(CommitInfo {
                    sha: commit.id.clone(),
                    message: commit.message.clone(),
                    author: commit.author.name.clone(),
                    url: commit.url.clone(),
                    branch: branch.to_owned(),
                    repository: push.repository.full_name.clone(),
                }),
                ..RepositoryLink::default()
            };
            let status = status_from_keywords(&commit.message);
            for task_id in &refs {
                self.apply(task_id, link.clone(), "push", status, report)
                    .await;
            }
        }
    }

    async fn on_pull_request(&self, event: &PullRequestEvent, report: &mut TriggerReport) {
        let pull = &event.pull_request;
        let link = RepositoryLink {
            git_branch: Some(pull.head.branch.clone()),
            pr_url: Some(pull.html_url.clone()),
            pr_number: Some(pull.number),
            pr_status: Some(pull.lifecycle_state()),
            last_commit: None,
        };
        let status = pull_request_status(&event.action, pull);
        for task_id in &extract_task_refs(&pull.text()) {
            self.apply(task_id, link.clone(), &event.action, status, report)
                .await;
        }
    }

    async fn on_review(&self, event: &PullRequestReviewEvent, report: &mut TriggerReport) {
        if event.action != "submitted" || !event.review.state.eq_ignore_ascii_case("approved") {
            debug!(
                action = %event.action,
                state = %event.review.state,
                "review does not approve"
            );
            return;
        }
        for task_id in extract_task_refs(&event.pull_request.text()) {
            let approved = DomainEvent::TaskPrApproved(TaskPrApproved {
                task_id: task_id.clone(),
                pr_number: event.pull_request.number,
                reviewer: event.review.user.login.clone(),
            });
            match self.publisher.publish(approved, self.clock.utc()).await {
                Ok(_) => report.touched(&task_id),
                Err(err) => report.failed(&task_id, ErrorKind::Internal, err.to_string()),
            }
        }
    }

    async fn apply(
        &self,
        task_id: &TaskId,
        link: RepositoryLink,
        action: &str,
        status: Option<TaskStatus>,
        report: &mut TriggerReport,
    ) {
        match self.link_then_move(task_id, link, action, status).await {
            Ok(()) => report.touched(task_id),
            Err(err) => report.failed(task_id, err.kind(), err.to_string()),
        }
    }

    async fn link_then_move(
        &self,
        task_id: &TaskId,
        link: RepositoryLink,
        action: &str,
        status: Option<TaskStatus>,
    ) -> Result<(), TaskServiceError> {
        self.engine
            .record_repository_link(task_id, link, action, &self.actor)
            .await?;
        if let Some(target) = status {
            self.engine
                .update_status(task_id, target.as_str(), &self.actor)
                .await?;
        }
        Ok(())
    }
}

fn pull_request_status(action: &str, pull: &PullRequest) -> Option<TaskStatus> {
    match action {
        "opened" => Some(TaskStatus::InReview),
        "closed" if pull.merged => Some(TaskStatus::Completed),
        _ => None,
    }
}

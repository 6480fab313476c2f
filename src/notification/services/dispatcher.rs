//! Turns domain events into messages for the affected users.

use crate::events::domain::{DomainEvent, EventEnvelope};
use crate::identity::{
    domain::UserId,
    ports::{DirectoryError, UserDirectory},
};
use crate::notification::{
    domain::{
        DispatchReport, FailedDelivery, MessageTemplate, OutboundMessage, TASK_ASSIGNED,
        TASK_CLOSED, TASK_STATUS_UPDATED,
    },
    ports::MessageSender,
};
use crate::store::{
    domain::{Entity, IndexQuery, ItemKey},
    ports::{KeyedStore, StoreError},
};
use crate::task::domain::TaskId;
use futures::future::join_all;
use minijinja::Environment;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a dispatch before any message is sent.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// Reading the task or its assignees failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Resolving recipients failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A message template failed to render.
    #[error("template rendering failed: {0}")]
    Template(String),
}

struct Plan {
    template: MessageTemplate,
    recipients: Vec<UserId>,
    actor: UserId,
    context: Value,
}

/// Notifies assignees and creators about task events.
///
/// Recipients that are absent or deactivated are skipped. A failed lookup
/// or delivery is recorded in the report and does not stop the others.
pub struct NotificationDispatcher<S, D, M>
where
    S: KeyedStore,
    D: UserDirectory,
    M: MessageSender,
{
    store: Arc<S>,
    directory: Arc<D>,
    sender: Arc<M>,
}

impl<S, D, M> Clone for NotificationDispatcher<S, D, M>
where
    S: KeyedStore,
    D: UserDirectory,
    M: MessageSender,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<S, D, M> NotificationDispatcher<S, D, M>
where
    S: KeyedStore,
    D: UserDirectory,
    M: MessageSender,
{
    /// Creates a new dispatcher.
    #[must_use]
    pub const fn new(store: Arc<S>, directory: Arc<D>, sender: Arc<M>) -> Self {
        Self {
            store,
            directory,
            sender,
        }
    }

    /// Sends the notifications an event calls for.
    ///
    /// Events other than assignment, status change, and closure produce an
    /// empty report.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the task or its assignees cannot
    /// be read, when every recipient lookup fails, or when the message
    /// cannot be rendered. A lookup failure for some recipients is recorded
    /// in the report for those recipients only.
    pub async fn dispatch(
        &self,
        envelope: &EventEnvelope,
    ) -> Result<DispatchReport, NotificationError> {
        let Some(plan) = self.plan(envelope.event()).await? else {
            debug!(detail_type = envelope.detail_type(), "event needs no notification");
            return Ok(DispatchReport::default());
        };

        let lookups = join_all(
            plan.recipients
                .iter()
                .map(|recipient| self.directory.find_user(recipient)),
        )
        .await;
        let actor_label = match self.directory.find_user(&plan.actor).await {
            Ok(Some(profile)) => profile.email,
            Ok(None) => plan.template.fallback_actor.to_owned(),
            Err(err) => {
                warn!(actor = %plan.actor, error = %err, "actor lookup failed");
                plan.template.fallback_actor.to_owned()
            }
        };
        let (subject, body) = render(plan.template, plan.context, &actor_label)?;

        let mut report = DispatchReport::default();
        let mut deliveries = Vec::new();
        let recipient_count = plan.recipients.len();
        let mut lookup_failures = 0;
        let mut lookup_error = None;
        for (recipient, lookup) in plan.recipients.into_iter().zip(lookups) {
            match lookup {
                Ok(Some(profile)) if profile.is_active() => deliveries.push((
                    recipient,
                    OutboundMessage {
                        to: profile.email,
                        subject: subject.clone(),
                        body: body.clone(),
                    },
                )),
                Ok(_) => {
                    debug!(recipient = %recipient, "skipping inactive or unknown recipient");
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(recipient = %recipient, error = %err, "recipient lookup failed");
                    lookup_failures += 1;
                    report.failed.push(FailedDelivery {
                        recipient,
                        error: err.to_string(),
                    });
                    lookup_error = Some(err);
                }
            }
        }
        if let Some(err) = lookup_error.filter(|_| lookup_failures == recipient_count) {
            return Err(NotificationError::Directory(err));
        }

        let outcomes = join_all(
            deliveries
                .iter()
                .map(|(_, message)| self.sender.send(message)),
        )
        .await;
        for ((recipient, _), outcome) in deliveries.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    warn!(recipient = %recipient, error = %err, "notification delivery failed");
                    report.failed.push(FailedDelivery {
                        recipient,
                        error: err.to_string(),
                    });
                }
            }
        }
        info!(
            detail_type = envelope.detail_type(),
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed.len(),
            "notifications dispatched"
        );
        Ok(report)
    }

    async fn plan(&self, event: &DomainEvent) -> Result<Option<Plan>, NotificationError> {
        let plan = match event {
            DomainEvent::TaskAssigned(payload) => Plan {
                template: TASK_ASSIGNED,
                recipients: vec![payload.assigned_to.clone()],
                actor: payload.assigned_by.clone(),
                context: json!({
                    "title": payload.task_title,
                    "priority": payload.priority.as_str(),
                }),
            },
            DomainEvent::TaskStatusUpdated(payload) => {
                let mut recipients = self.creator_of(&payload.task_id).await?;
                for assignee in self.assignees_of(&payload.task_id).await? {
                    if !recipients.contains(&assignee) {
                        recipients.push(assignee);
                    }
                }
                Plan {
                    template: TASK_STATUS_UPDATED,
                    recipients,
                    actor: payload.updated_by.clone(),
                    context: json!({
                        "title": payload.task_title,
                        "previous_status": payload.previous_status.as_str(),
                        "new_status": payload.new_status.as_str(),
                    }),
                }
            }
            DomainEvent::TaskClosed(payload) => Plan {
                template: TASK_CLOSED,
                recipients: self.assignees_of(&payload.task_id).await?,
                actor: payload.closed_by.clone(),
                context: json!({
                    "title": payload.task_title,
                    "final_status": payload.final_status.as_str(),
                }),
            },
            DomainEvent::TaskCreated(_)
            | DomainEvent::TaskUpdated(_)
            | DomainEvent::CommentAdded(_)
            | DomainEvent::TaskUpdatedFromExternalTrigger(_)
            | DomainEvent::TaskPrApproved(_) => return Ok(None),
        };
        Ok(Some(plan))
    }

    async fn creator_of(&self, task_id: &TaskId) -> Result<Vec<UserId>, NotificationError> {
        let task = self.store.get(&ItemKey::task(task_id)).await?;
        Ok(task
            .and_then(Entity::into_task)
            .map(|found| found.created_by().clone())
            .into_iter()
            .collect())
    }

    async fn assignees_of(&self, task_id: &TaskId) -> Result<Vec<UserId>, NotificationError> {
        let rows = self
            .store
            .query_all(&IndexQuery::assignments_of(task_id))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(Entity::into_assignment)
            .map(|assignment| assignment.user_id().clone())
            .collect())
    }
}

fn render(
    template: MessageTemplate,
    mut context: Value,
    actor: &str,
) -> Result<(String, String), NotificationError> {
    if let Value::Object(fields) = &mut context {
        fields.insert("actor".to_owned(), Value::String(actor.to_owned()));
    }
    let environment = Environment::new();
    let render_one = |source: &str| {
        environment
            .render_str(source, &context)
            .map_err(|err| NotificationError::Template(err.to_string()))
    };
    Ok((render_one(template.subject)?, render_one(template.body)?))
}

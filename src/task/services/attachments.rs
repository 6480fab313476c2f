//! Attachment records created from object-store notifications.

use super::{TaskServiceResult, lookup::load_task};
use crate::identity::domain::UserId;
use crate::store::{
    domain::{Entity, ItemKey, WriteCondition},
    ports::{KeyedStore, StoreError},
};
use crate::task::domain::{Attachment, AttachmentPolicy, TaskId, UploadedObject};
use mockable::Clock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// New-object notification from the object store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCreated {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// MIME content type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// User metadata attached at upload time.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ObjectCreated {
    /// Looks up a metadata value, ignoring key case.
    #[must_use]
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }
}

/// Turns uploaded objects into [`Attachment`] rows.
#[derive(Clone)]
pub struct AttachmentRecorder<S, C>
where
    S: KeyedStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    policy: AttachmentPolicy,
}

impl<S, C> AttachmentRecorder<S, C>
where
    S: KeyedStore,
    C: Clock + Send + Sync,
{
    /// Creates a recorder enforcing `policy`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, policy: AttachmentPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Records an attachment for an uploaded object.
    ///
    /// Objects without `taskId` and `userId` metadata are not attachments
    /// and yield `Ok(None)`. A redelivered notification returns the
    /// attachment recorded the first time.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Domain`] for disallowed types or
    /// oversize files, [`super::TaskServiceError::TaskNotFound`] when the
    /// task is absent, and store failures.
    pub async fn record(&self, object: ObjectCreated) -> TaskServiceResult<Option<Attachment>> {
        let (Some(raw_task), Some(raw_user)) = (
            object.metadata_value("taskId"),
            object.metadata_value("userId"),
        ) else {
            debug!(bucket = %object.bucket, key = %object.key, "object has no task metadata");
            return Ok(None);
        };
        let task_id = TaskId::new(raw_task)?;
        let Ok(uploaded_by) = UserId::new(raw_user) else {
            debug!(key = %object.key, "object has an invalid uploader");
            return Ok(None);
        };
        load_task(&*self.store, &task_id).await?;

        let attachment = Attachment::record(
            task_id,
            uploaded_by,
            UploadedObject {
                bucket: object.bucket,
                storage_key: object.key,
                content_type: object.content_type,
                size: object.size,
            },
            &self.policy,
            &*self.clock,
        )?;
        match self
            .store
            .put(
                Entity::Attachment(attachment.clone()),
                Some(WriteCondition::NotExists),
            )
            .await
        {
            Ok(()) => {}
            Err(StoreError::ConditionFailed(_)) => {
                debug!(
                    task_id = %attachment.task_id(),
                    attachment_id = %attachment.id(),
                    "attachment already recorded"
                );
                let existing = self
                    .store
                    .get(&ItemKey::attachment(attachment.task_id(), attachment.id()))
                    .await?
                    .and_then(Entity::into_attachment);
                return Ok(Some(existing.unwrap_or(attachment)));
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            task_id = %attachment.task_id(),
            file_name = attachment.file_name(),
            size = attachment.file_size(),
            "attachment recorded"
        );
        Ok(Some(attachment))
    }
}

//! Assignment, comment, and attachment records hanging off a task.

use super::{AttachmentId, CommentId, TaskDomainError, TaskId};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Links a user to a task. At most one exists per `(task, user)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    task_id: TaskId,
    user_id: UserId,
    assigned_by: UserId,
    assigned_at: DateTime<Utc>,
}

impl Assignment {
    /// Creates an assignment stamped with the current time.
    #[must_use]
    pub fn new(task_id: TaskId, user_id: UserId, assigned_by: UserId, clock: &impl Clock) -> Self {
        Self {
            task_id,
            user_id,
            assigned_by,
            assigned_at: clock.utc(),
        }
    }

    /// Returns the task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the administrator who made the assignment.
    #[must_use]
    pub const fn assigned_by(&self) -> &UserId {
        &self.assigned_by
    }

    /// Returns when the assignment was made.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }
}

/// Immutable comment on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "commentId")]
    id: CommentId,
    task_id: TaskId,
    author_id: UserId,
    content: String,
    #[serde(default)]
    mentions: Vec<UserId>,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyComment`] when the content is blank.
    pub fn new(
        task_id: TaskId,
        author_id: UserId,
        content: &str,
        mentions: Vec<UserId>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyComment);
        }
        let mut unique_mentions: Vec<UserId> = Vec::with_capacity(mentions.len());
        for mention in mentions {
            if !unique_mentions.contains(&mention) {
                unique_mentions.push(mention);
            }
        }
        Ok(Self {
            id: CommentId::new(),
            task_id,
            author_id,
            content: trimmed.to_owned(),
            mentions: unique_mentions,
            created_at: clock.utc(),
        })
    }

    /// Returns the comment identifier.
    #[must_use]
    pub const fn id(&self) -> CommentId {
        self.id
    }

    /// Returns the task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// Returns the body text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the mentioned users.
    #[must_use]
    pub fn mentions(&self) -> &[UserId] {
        &self.mentions
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Limits applied to uploaded attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    /// Accepted MIME content types.
    pub allowed_types: Vec<String>,
    /// Largest accepted object in bytes.
    pub max_size_bytes: u64,
}

impl AttachmentPolicy {
    /// Default size limit: 10 MiB.
    pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

    /// Checks an object against the policy.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AttachmentTypeNotAllowed`] or
    /// [`TaskDomainError::AttachmentTooLarge`].
    pub fn check(&self, content_type: &str, size: u64) -> Result<(), TaskDomainError> {
        if !self
            .allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
        {
            return Err(TaskDomainError::AttachmentTypeNotAllowed(
                content_type.to_owned(),
            ));
        }
        if size > self.max_size_bytes {
            return Err(TaskDomainError::AttachmentTooLarge {
                size,
                limit: self.max_size_bytes,
            });
        }
        Ok(())
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            allowed_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "application/pdf",
                "text/plain",
                "application/json",
            ]
            .map(str::to_owned)
            .to_vec(),
            max_size_bytes: Self::DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

/// Metadata for a file uploaded against a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "attachmentId")]
    id: AttachmentId,
    task_id: TaskId,
    file_name: String,
    file_size: u64,
    file_type: String,
    storage_key: String,
    uploaded_by: UserId,
    uploaded_at: DateTime<Utc>,
}

/// Uploaded object as reported by the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object key within the bucket.
    pub storage_key: String,
    /// MIME content type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
}

impl Attachment {
    /// Creates an attachment record after checking the policy.
    ///
    /// The file name is the last `/`-separated segment of the storage key.
    /// The identifier is derived from the bucket and key, so recording the
    /// same object twice yields the same attachment.
    ///
    /// # Errors
    ///
    /// Returns the policy violation, if any.
    pub fn record(
        task_id: TaskId,
        uploaded_by: UserId,
        object: UploadedObject,
        policy: &AttachmentPolicy,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        policy.check(&object.content_type, object.size)?;
        let file_name = object
            .storage_key
            .rsplit('/')
            .next()
            .unwrap_or(object.storage_key.as_str())
            .to_owned();
        Ok(Self {
            id: AttachmentId::for_object(&object.bucket, &object.storage_key),
            task_id,
            file_name,
            file_size: object.size,
            file_type: object.content_type,
            storage_key: object.storage_key,
            uploaded_by,
            uploaded_at: clock.utc(),
        })
    }

    /// Returns the attachment identifier.
    #[must_use]
    pub const fn id(&self) -> AttachmentId {
        self.id
    }

    /// Returns the task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the MIME content type.
    #[must_use]
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    /// Returns the object-store key.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Returns the uploader.
    #[must_use]
    pub const fn uploaded_by(&self) -> &UserId {
        &self.uploaded_by
    }

    /// Returns the upload timestamp.
    #[must_use]
    pub const fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }
}

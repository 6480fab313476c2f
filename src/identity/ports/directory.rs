//! Port for resolving users from the identity provider's directory.

use crate::error::{ApiError, ErrorKind};
use crate::identity::domain::{UserId, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read access to the identity provider's user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by subject identifier.
    ///
    /// Returns `None` when the user does not exist.
    async fn find_user(&self, user_id: &UserId) -> DirectoryResult<Option<UserProfile>>;

    /// Lists every user known to the directory.
    async fn list_users(&self) -> DirectoryResult<Vec<UserProfile>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The directory could not be reached.
    #[error("user directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a directory failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self::new(ErrorKind::Internal, err.to_string())
    }
}

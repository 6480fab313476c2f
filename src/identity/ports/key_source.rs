//! Port for retrieving the identity provider's published signing keys.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for signing-key retrieval.
pub type KeySourceResult<T> = Result<T, KeySourceError>;

/// Source of the verification keys published by the identity provider.
#[async_trait]
pub trait SigningKeySource: Send + Sync {
    /// Fetches the current key set.
    ///
    /// # Errors
    ///
    /// Returns [`KeySourceError`] when the keys cannot be retrieved or
    /// decoded.
    async fn fetch(&self) -> KeySourceResult<JwkSet>;
}

/// Errors returned by signing-key sources.
#[derive(Debug, Clone, Error)]
pub enum KeySourceError {
    /// The key endpoint could not be reached.
    #[error("signing keys unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The key endpoint returned a document that is not a key set.
    #[error("malformed signing key set: {0}")]
    Malformed(String),
}

impl KeySourceError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

//! User listing and sign-up admission.

use crate::identity::{
    domain::{Actor, IdentityDomainError, SignUpPolicy, UserProfile},
    ports::{DirectoryResult, UserDirectory},
};
use std::sync::Arc;

/// Read-side service backing `GET /users`.
#[derive(Clone)]
pub struct UserQueryService<D>
where
    D: UserDirectory,
{
    directory: Arc<D>,
}

impl<D> UserQueryService<D>
where
    D: UserDirectory,
{
    /// Creates a new user query service.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Lists users that are enabled and have completed onboarding.
    ///
    /// # Errors
    ///
    /// Returns the directory error when the listing cannot be retrieved.
    pub async fn list_users(&self, actor: &Actor) -> DirectoryResult<Vec<UserProfile>> {
        let users = self.directory.list_users().await?;
        let listed: Vec<UserProfile> = users.into_iter().filter(UserProfile::is_listable).collect();
        tracing::debug!(requested_by = %actor.user_id(), count = listed.len(), "listed users");
        Ok(listed)
    }
}

/// Pre-registration hook applying the sign-up domain policy.
#[derive(Debug, Clone, Default)]
pub struct SignUpGuard {
    policy: SignUpPolicy,
}

impl SignUpGuard {
    /// Creates a guard for the given policy.
    #[must_use]
    pub const fn new(policy: SignUpPolicy) -> Self {
        Self { policy }
    }

    /// Admits or rejects a sign-up attempt.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError`] when the email is malformed or its
    /// domain is not allowed.
    pub fn admit(&self, email: &str) -> Result<(), IdentityDomainError> {
        self.policy.admit(email).inspect_err(|err| {
            tracing::warn!(email, error = %err, "blocked sign-up attempt");
        })
    }
}

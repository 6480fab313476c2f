//! Authenticated actor context passed into mutation services.

use super::UserId;
use serde::{Deserialize, Serialize};

/// Prefix applied to the identifiers of system actors.
const SYSTEM_ACTOR_PREFIX: &str = "system:";

/// Kind of principal behind an [`Actor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A human user authenticated with a bearer credential.
    User,
    /// An internal integration acting on the system's behalf.
    System,
}

/// Identity with resolved role on whose behalf an operation executes.
///
/// Services receive the actor opaquely and evaluate only role and
/// assignment predicates; they never re-validate the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    email: Option<String>,
    groups: Vec<String>,
    is_admin: bool,
    kind: ActorKind,
}

impl Actor {
    /// Creates an actor from verified credential claims.
    #[must_use]
    pub fn from_claims(
        user_id: UserId,
        email: Option<String>,
        groups: Vec<String>,
        admin_group: &str,
    ) -> Self {
        let is_admin = groups.iter().any(|group| group == admin_group);
        Self {
            user_id,
            email,
            groups,
            is_admin,
            kind: ActorKind::User,
        }
    }

    /// Creates a non-admin member actor.
    #[must_use]
    pub const fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            groups: Vec::new(),
            is_admin: false,
            kind: ActorKind::User,
        }
    }

    /// Creates an administrator actor.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            groups: Vec::new(),
            is_admin: true,
            kind: ActorKind::User,
        }
    }

    /// Creates an admin-equivalent system actor for internal integrations.
    ///
    /// The identifier is `system:<name>`.
    #[must_use]
    pub fn system(name: &str) -> Self {
        Self {
            user_id: UserId::from_trusted(format!("{SYSTEM_ACTOR_PREFIX}{}", name.trim())),
            email: None,
            groups: Vec::new(),
            is_admin: true,
            kind: ActorKind::System,
        }
    }

    /// Sets the actor's email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns the actor's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the actor's email address, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the actor's group memberships.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns `true` for administrators and system actors.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns the principal kind.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Returns `true` for system actors.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.kind == ActorKind::System
    }
}

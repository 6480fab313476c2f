//! User identifiers and identity-provider user records.

use super::IdentityDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyUserId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyUserId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Wraps an identifier that is non-empty by construction.
    pub(crate) const fn from_trusted(value: String) -> Self {
        Self(value)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account status reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Account confirmed and usable.
    Confirmed,
    /// Sign-up not yet confirmed.
    Unconfirmed,
    /// Account must set a new password before first use.
    ForceChangePassword,
    /// Account deactivated by an administrator.
    Deactivated,
}

/// User record resolved from the identity provider's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Subject identifier.
    pub user_id: UserId,
    /// Delivery address for notifications.
    pub email: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Whether the user belongs to the administrator group.
    pub is_admin: bool,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// Account status.
    pub status: AccountStatus,
}

impl UserProfile {
    /// Creates an enabled, confirmed member profile.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: None,
            groups: Vec::new(),
            is_admin: false,
            enabled: true,
            status: AccountStatus::Confirmed,
        }
    }

    /// Marks the profile as a member of the administrator group.
    #[must_use]
    pub fn with_admin_group(mut self, admin_group: impl Into<String>) -> Self {
        self.groups.push(admin_group.into());
        self.is_admin = true;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the account status.
    #[must_use]
    pub const fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Disables the account.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns `true` when the account may receive assignments and
    /// notifications.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.status != AccountStatus::Deactivated
    }

    /// Returns `true` when the account should appear in user listings.
    #[must_use]
    pub fn is_listable(&self) -> bool {
        self.is_active() && self.status != AccountStatus::ForceChangePassword
    }
}

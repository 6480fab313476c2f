//! Error types for identity domain validation.

use thiserror::Error;

/// Errors returned while constructing identity values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The email address has no domain part.
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    /// The email domain is not on the sign-up allow list.
    #[error("email domain '{domain}' is not allowed; allowed domains: {allowed}")]
    DomainNotAllowed {
        /// Rejected domain.
        domain: String,
        /// Comma-separated allow list.
        allowed: String,
    },
}

//! Sign-up admission policy based on the email domain.

use super::IdentityDomainError;

/// Restricts self-service sign-up to an allow list of email domains.
///
/// An empty allow list admits every domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpPolicy {
    allowed_domains: Vec<String>,
}

impl SignUpPolicy {
    /// Creates a policy from a list of allowed domains.
    #[must_use]
    pub fn new(allowed_domains: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|domain| domain.trim().to_ascii_lowercase())
                .filter(|domain| !domain.is_empty())
                .collect(),
        }
    }

    /// Returns the normalized allow list.
    #[must_use]
    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Checks whether an email address may sign up.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::InvalidEmail`] when the address has no
    /// domain, or [`IdentityDomainError::DomainNotAllowed`] when the domain is
    /// not on the allow list.
    pub fn admit(&self, email: &str) -> Result<(), IdentityDomainError> {
        let domain = email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim().to_ascii_lowercase())
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| IdentityDomainError::InvalidEmail(email.to_owned()))?;

        if self.allowed_domains.is_empty() || self.allowed_domains.contains(&domain) {
            return Ok(());
        }

        Err(IdentityDomainError::DomainNotAllowed {
            domain,
            allowed: self.allowed_domains.join(", "),
        })
    }
}

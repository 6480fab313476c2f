//! Shared-secret webhook signatures.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Errors returned when a webhook signature does not verify.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No signature header was supplied.
    #[error("missing webhook signature")]
    Missing,

    /// The header is not `sha256=<hex>`.
    #[error("malformed webhook signature")]
    Malformed,

    /// The signature does not match the body.
    #[error("webhook signature mismatch")]
    Mismatch,
}

/// Verifies `sha256=<hex>` HMAC signatures over raw request bodies.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    /// Creates a verifier for the shared secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Returns the signature header value for `body`.
    #[must_use]
    pub fn sign(&self, body: &[u8]) -> String {
        format!("{SIGNATURE_PREFIX}{}", hex::encode(self.digest(body)))
    }

    /// Checks `header` against the HMAC of `body` in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the header is absent, malformed, or
    /// does not match.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let encoded = header
            .trim()
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(SignatureError::Malformed)?;
        let presented = hex::decode(encoded).map_err(|_| SignatureError::Malformed)?;
        let expected = self.digest(body);
        if bool::from(expected.as_slice().ct_eq(presented.as_slice())) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    fn digest(&self, body: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length, so construction cannot fail.
        <Hmac<Sha256> as Mac>::new_from_slice(self.secret.expose_secret().as_bytes()).map_or_else(
            |_| Vec::new(),
            |mut mac| {
                mac.update(body);
                mac.finalize().into_bytes().to_vec()
            },
        )
    }
}

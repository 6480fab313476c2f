//! Bearer credential verification and actor resolution.

use crate::error::{ApiError, ErrorKind};
use crate::identity::{
    domain::{Actor, UserId},
    ports::{KeySourceError, SigningKeySource},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    errors::ErrorKind as JwtErrorKind,
    jwk::{Jwk, JwkSet},
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Configuration for credential verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim; audience is not checked when `None`.
    pub audience: Option<String>,
    /// Group granting administrator rights.
    pub admin_group: String,
    /// Claim carrying group memberships.
    pub groups_claim: String,
    /// How long fetched signing keys are trusted before a refresh.
    pub key_cache_ttl: Duration,
    /// Minimum gap between refreshes triggered by unknown key ids.
    pub forced_refresh_interval: Duration,
    /// Signature algorithms accepted in token headers.
    pub allowed_algorithms: Vec<Algorithm>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            audience: None,
            admin_group: "Admins".to_owned(),
            groups_claim: "cognito:groups".to_owned(),
            key_cache_ttl: Duration::from_secs(600),
            forced_refresh_interval: Duration::from_secs(60),
            allowed_algorithms: vec![Algorithm::RS256],
        }
    }
}

impl IdentityConfig {
    /// Creates a configuration for the given issuer with default settings.
    #[must_use]
    pub fn for_issuer(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// Returns the conventional JWKS URL published under the issuer.
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer.trim_end_matches('/'))
    }

    /// Sets the expected audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets the administrator group name.
    #[must_use]
    pub fn with_admin_group(mut self, admin_group: impl Into<String>) -> Self {
        self.admin_group = admin_group.into();
        self
    }

    /// Sets the signing-key cache lifetime.
    #[must_use]
    pub const fn with_key_cache_ttl(mut self, ttl: Duration) -> Self {
        self.key_cache_ttl = ttl;
        self
    }

    /// Sets the minimum gap between unknown-key refreshes.
    #[must_use]
    pub const fn with_forced_refresh_interval(mut self, interval: Duration) -> Self {
        self.forced_refresh_interval = interval;
        self
    }

    /// Replaces the accepted signature algorithms.
    #[must_use]
    pub fn with_allowed_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }
}

/// Reasons a credential is rejected.
#[derive(Debug, Clone, Error)]
pub enum GateError {
    /// No `Authorization` header was supplied.
    #[error("missing authorization header")]
    MissingCredential,

    /// The header does not use the `Bearer` scheme.
    #[error("invalid authorization scheme")]
    InvalidScheme,

    /// The token is malformed or fails claim validation.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token has expired.
    #[error("token expired")]
    ExpiredToken,

    /// The token signature does not match the signing key.
    #[error("token signature mismatch")]
    SignatureMismatch,

    /// The token names a key the identity provider does not publish.
    #[error("unknown signing key '{0}'")]
    UnknownSigningKey(String),

    /// The signing keys could not be retrieved.
    #[error(transparent)]
    KeySource(#[from] KeySourceError),
}

impl GateError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::KeySource(_) => ErrorKind::Internal,
            _ => ErrorKind::Unauthorized,
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err.kind() {
            ErrorKind::Unauthorized => Self::new(ErrorKind::Unauthorized, "Unauthorized"),
            kind => Self::new(kind, err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedKeys {
    keys: JwkSet,
    fetched_at: DateTime<Utc>,
    forced_at: Option<DateTime<Utc>>,
}

/// Resolves an [`Actor`] from a bearer credential.
///
/// Signing keys are cached for [`IdentityConfig::key_cache_ttl`] and
/// refreshed early when a token names an unknown key id, at most once per
/// [`IdentityConfig::forced_refresh_interval`].
pub struct IdentityGate<K, C>
where
    K: SigningKeySource,
    C: Clock + Send + Sync,
{
    key_source: Arc<K>,
    clock: Arc<C>,
    config: IdentityConfig,
    cache: RwLock<Option<CachedKeys>>,
}

impl<K, C> IdentityGate<K, C>
where
    K: SigningKeySource,
    C: Clock + Send + Sync,
{
    /// Creates a gate with an empty key cache.
    #[must_use]
    pub fn new(key_source: Arc<K>, clock: Arc<C>, config: IdentityConfig) -> Self {
        Self {
            key_source,
            clock,
            config,
            cache: RwLock::new(None),
        }
    }

    /// Returns the gate configuration.
    #[must_use]
    pub const fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Verifies the `Authorization` header value and resolves the actor.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when the credential is missing, malformed,
    /// expired, signed by an unknown key, or fails signature verification.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Actor, GateError> {
        let token = extract_bearer_token(authorization)?;
        let header = decode_header(token).map_err(|err| GateError::InvalidToken(err.to_string()))?;

        if !self.config.allowed_algorithms.contains(&header.alg) {
            return Err(GateError::InvalidToken(format!(
                "algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let key_id = header
            .kid
            .ok_or_else(|| GateError::InvalidToken("missing key id".to_owned()))?;
        let jwk = self.signing_key(&key_id).await?;
        let decoding_key =
            DecodingKey::from_jwk(&jwk).map_err(|err| GateError::InvalidToken(err.to_string()))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        let claims = decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(|err| match err.kind() {
                JwtErrorKind::ExpiredSignature => GateError::ExpiredToken,
                JwtErrorKind::InvalidSignature => GateError::SignatureMismatch,
                _ => GateError::InvalidToken(err.to_string()),
            })?
            .claims;

        let actor = self.actor_from_claims(&claims)?;
        tracing::debug!(user_id = %actor.user_id(), is_admin = actor.is_admin(), "credential verified");
        Ok(actor)
    }

    fn actor_from_claims(&self, claims: &Map<String, Value>) -> Result<Actor, GateError> {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .ok_or_else(|| GateError::InvalidToken("missing subject claim".to_owned()))?;
        let user_id =
            UserId::new(subject).map_err(|err| GateError::InvalidToken(err.to_string()))?;
        let email = claims
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let groups = claims
            .get(&self.config.groups_claim)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Actor::from_claims(
            user_id,
            email,
            groups,
            &self.config.admin_group,
        ))
    }

    async fn signing_key(&self, key_id: &str) -> Result<Jwk, GateError> {
        let (forced, last_forced) = {
            let cache = self.cache.read().await;
            let fresh = cache.as_ref().filter(|cached| self.is_fresh(cached));
            if let Some(jwk) = fresh.and_then(|cached| cached.keys.find(key_id)) {
                return Ok(jwk.clone());
            }
            let last_forced = cache.as_ref().and_then(|cached| cached.forced_at);
            let throttled = last_forced
                .is_some_and(|at| self.is_recent(at, self.config.forced_refresh_interval));
            if fresh.is_some() && throttled {
                tracing::debug!(key_id, "unknown signing key; refresh throttled");
                return Err(GateError::UnknownSigningKey(key_id.to_owned()));
            }
            (fresh.is_some(), last_forced)
        };

        let keys = self.key_source.fetch().await?;
        tracing::debug!(key_count = keys.keys.len(), forced, "refreshed signing keys");
        let found = keys.find(key_id).cloned();
        let fetched_at = self.clock.utc();
        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at,
            forced_at: if forced { Some(fetched_at) } else { last_forced },
        });

        found.ok_or_else(|| GateError::UnknownSigningKey(key_id.to_owned()))
    }

    fn is_fresh(&self, cached: &CachedKeys) -> bool {
        self.is_recent(cached.fetched_at, self.config.key_cache_ttl)
    }

    fn is_recent(&self, at: DateTime<Utc>, window: Duration) -> bool {
        let age = self.clock.utc().signed_duration_since(at);
        age.to_std().map(|elapsed| elapsed < window).unwrap_or(true)
    }
}

/// Extracts the token from a `Bearer` authorization header value.
///
/// # Errors
///
/// Returns [`GateError::MissingCredential`] when the header is absent and
/// [`GateError::InvalidScheme`] when it is not a non-empty bearer token.
pub fn extract_bearer_token(header_value: Option<&str>) -> Result<&str, GateError> {
    let raw = header_value.ok_or(GateError::MissingCredential)?;
    let token = raw
        .trim()
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(GateError::InvalidScheme)?;
    if token.is_empty() {
        return Err(GateError::InvalidScheme);
    }
    Ok(token)
}

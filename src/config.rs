//! Process configuration.
//!
//! Every setting has a default except the token issuer. Values are read
//! from `TASKLANE_*` environment variables; [`AppConfig::load`] first
//! merges a `.env` file when one is present.

use crate::identity::services::IdentityConfig;
use crate::pipeline::{DEFAULT_BATCH_SIZE, DEFAULT_POLL_INTERVAL};
use crate::store::adapters::retry::RetryPolicy;
use crate::task::domain::AttachmentPolicy;
use crate::telemetry::{LogFormat, TelemetryConfig};
use crate::trigger::domain::WebhookVerifier;
use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const ISSUER: &str = "TASKLANE_ISSUER";
const AUDIENCE: &str = "TASKLANE_AUDIENCE";
const ADMIN_GROUP: &str = "TASKLANE_ADMIN_GROUP";
const GROUPS_CLAIM: &str = "TASKLANE_GROUPS_CLAIM";
const KEY_CACHE_TTL_SECS: &str = "TASKLANE_KEY_CACHE_TTL_SECS";
const KEY_REFRESH_INTERVAL_SECS: &str = "TASKLANE_KEY_REFRESH_INTERVAL_SECS";
const WEBHOOK_SECRET: &str = "TASKLANE_WEBHOOK_SECRET";
const TABLE_NAME: &str = "TASKLANE_TABLE_NAME";
const STORE_MAX_RETRIES: &str = "TASKLANE_STORE_MAX_RETRIES";
const ATTACHMENT_TYPES: &str = "TASKLANE_ATTACHMENT_TYPES";
const ATTACHMENT_MAX_BYTES: &str = "TASKLANE_ATTACHMENT_MAX_BYTES";
const CHANGE_BATCH_SIZE: &str = "TASKLANE_CHANGE_BATCH_SIZE";
const POLL_INTERVAL_MS: &str = "TASKLANE_POLL_INTERVAL_MS";
const LOG_FORMAT: &str = "TASKLANE_LOG_FORMAT";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable could not be parsed.
    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

/// Shared secret for repository webhooks.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    secret: SecretString,
}

impl WebhookConfig {
    /// Wraps a shared secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
        }
    }

    /// Returns a verifier for the secret.
    #[must_use]
    pub fn verifier(&self) -> WebhookVerifier {
        WebhookVerifier::new(self.secret.clone())
    }
}

/// Persistent store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Table holding every entity.
    pub table_name: String,
    /// Backoff applied to transient store failures.
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: "tasklane".to_owned(),
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Sets the table name.
    #[must_use]
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Background worker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Change records read per poll.
    pub batch_size: usize,
    /// Idle wait between change-feed polls.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Credential verification.
    pub identity: IdentityConfig,
    /// Webhook secret; repository triggers are disabled when `None`.
    pub webhook: Option<WebhookConfig>,
    /// Persistent store.
    pub store: StoreConfig,
    /// Attachment limits.
    pub attachments: AttachmentPolicy,
    /// Background workers.
    pub workers: WorkerConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Returns a configuration with defaults for the given issuer.
    #[must_use]
    pub fn for_issuer(issuer: impl Into<String>) -> Self {
        Self {
            identity: IdentityConfig::for_issuer(issuer),
            webhook: None,
            store: StoreConfig::default(),
            attachments: AttachmentPolicy::default(),
            workers: WorkerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Enables repository triggers with the given secret.
    #[must_use]
    pub fn with_webhook(mut self, webhook: WebhookConfig) -> Self {
        self.webhook = Some(webhook);
        self
    }

    /// Builds a configuration from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the issuer is unset and
    /// [`ConfigError::Invalid`] when a numeric or enumerated value does not
    /// parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let issuer = read(ISSUER).ok_or(ConfigError::Missing(ISSUER))?;
        let mut config = Self::for_issuer(issuer);

        if let Some(audience) = read(AUDIENCE) {
            config.identity = config.identity.with_audience(audience);
        }
        if let Some(group) = read(ADMIN_GROUP) {
            config.identity = config.identity.with_admin_group(group);
        }
        if let Some(claim) = read(GROUPS_CLAIM) {
            config.identity.groups_claim = claim;
        }
        if let Some(secs) = parsed::<u64>(KEY_CACHE_TTL_SECS, read(KEY_CACHE_TTL_SECS))? {
            config.identity = config
                .identity
                .with_key_cache_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) =
            parsed::<u64>(KEY_REFRESH_INTERVAL_SECS, read(KEY_REFRESH_INTERVAL_SECS))?
        {
            config.identity = config
                .identity
                .with_forced_refresh_interval(Duration::from_secs(secs));
        }

        config.webhook = read(WEBHOOK_SECRET).map(WebhookConfig::new);

        if let Some(table) = read(TABLE_NAME) {
            config.store = config.store.with_table_name(table);
        }
        if let Some(retries) = parsed::<usize>(STORE_MAX_RETRIES, read(STORE_MAX_RETRIES))? {
            config.store.retry.max_retries = retries;
        }

        if let Some(types) = read(ATTACHMENT_TYPES) {
            config.attachments.allowed_types = types
                .split(',')
                .map(str::trim)
                .filter(|kind| !kind.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(bytes) = parsed::<u64>(ATTACHMENT_MAX_BYTES, read(ATTACHMENT_MAX_BYTES))? {
            config.attachments.max_size_bytes = bytes;
        }

        if let Some(size) = parsed::<usize>(CHANGE_BATCH_SIZE, read(CHANGE_BATCH_SIZE))? {
            config.workers.batch_size = size.max(1);
        }
        if let Some(millis) = parsed::<u64>(POLL_INTERVAL_MS, read(POLL_INTERVAL_MS))? {
            config.workers.poll_interval = Duration::from_millis(millis);
        }

        if let Some(format) = parsed::<LogFormat>(LOG_FORMAT, read(LOG_FORMAT))? {
            config.telemetry = config.telemetry.with_format(format);
        }
        Ok(config)
    }

    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads `.env` when present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_lookup`].
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            debug!(error = %err, "no .env file loaded");
        }
        Self::from_env()
    }
}

fn parsed<T>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
            value,
        })
    })
    .transpose()
}

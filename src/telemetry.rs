//! Tracing subscriber installation.

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line records.
    #[default]
    Plain,
    /// One JSON object per record.
    Json,
}

/// Error returned for an unrecognised log format name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown log format '{0}', expected 'plain' or 'json'")]
pub struct ParseLogFormatError(String);

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "pretty" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(ParseLogFormatError(value.to_owned())),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_owned(),
            format: LogFormat::Plain,
        }
    }
}

impl TelemetryConfig {
    /// Sets the fallback filter directive.
    #[must_use]
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Error returned when a global subscriber is already installed.
#[derive(Debug, Error)]
#[error("tracing subscriber already installed: {0}")]
pub struct TelemetryInitError(#[from] tracing_subscriber::util::TryInitError);

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to
/// [`TelemetryConfig::default_filter`].
///
/// # Errors
///
/// Returns [`TelemetryInitError`] when a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryInitError> {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    match config.format {
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LogFormat, TelemetryConfig, init_tracing};
    use rstest::rstest;

    #[rstest]
    #[case("plain", LogFormat::Plain)]
    #[case("Pretty", LogFormat::Plain)]
    #[case(" JSON ", LogFormat::Json)]
    fn log_formats_parse(#[case] raw: &str, #[case] expected: LogFormat) {
        assert_eq!(raw.parse::<LogFormat>(), Ok(expected));
    }

    #[rstest]
    fn unknown_log_format_is_rejected() {
        let err = "xml".parse::<LogFormat>().expect_err("xml is not a format");
        assert!(err.to_string().contains("xml"));
    }

    #[rstest]
    fn second_install_fails() {
        let config = TelemetryConfig::default().with_format(LogFormat::Json);
        let _first = init_tracing(&config);
        let second = init_tracing(&config);

        assert!(second.is_err());
    }
}

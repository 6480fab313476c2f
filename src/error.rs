//! Transport-facing error taxonomy.
//!
//! Services return their own error enums; each exposes a [`ErrorKind`] so
//! the (external) HTTP boundary can map failures to status codes without
//! inspecting variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category shared by every service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or invalid credential.
    Unauthorized,
    /// Role or assignment predicate failed.
    PermissionDenied,
    /// Entity absent.
    NotFound,
    /// Malformed input or illegal transition.
    ValidationError,
    /// Conditional-write race.
    Conflict,
    /// Store, bus, or provider failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::ValidationError => 400,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    /// Returns `true` when the caller may retry after re-fetching state.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict | Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthorized => "unauthorized",
            Self::PermissionDenied => "permission denied",
            Self::NotFound => "not found",
            Self::ValidationError => "validation error",
            Self::Conflict => "conflict",
            Self::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// Error body returned by the HTTP surface: `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Transport status code.
    #[serde(skip)]
    pub status: u16,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// Builds an error body for the given category.
    ///
    /// Internal failures are reported with a generic message so store and
    /// provider details do not leak to callers.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = if kind == ErrorKind::Internal {
            "internal error".to_owned()
        } else {
            message.into()
        };
        Self {
            status: kind.status_code(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, ErrorKind};
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Unauthorized, 401)]
    #[case(ErrorKind::PermissionDenied, 403)]
    #[case(ErrorKind::NotFound, 404)]
    #[case(ErrorKind::ValidationError, 400)]
    #[case(ErrorKind::Conflict, 409)]
    #[case(ErrorKind::Internal, 500)]
    fn status_codes_follow_taxonomy(#[case] kind: ErrorKind, #[case] expected: u16) {
        assert_eq!(kind.status_code(), expected);
    }

    #[rstest]
    fn api_error_serializes_message_only() {
        let body = ApiError::new(ErrorKind::NotFound, "Task not found");
        let json = serde_json::to_value(&body).expect("serialize error body");
        assert_eq!(json, serde_json::json!({ "message": "Task not found" }));
        assert_eq!(body.status, 404);
    }

    #[rstest]
    fn internal_errors_hide_details() {
        let body = ApiError::new(ErrorKind::Internal, "connection refused to 10.0.0.4");
        assert_eq!(body.message, "internal error");
    }
}

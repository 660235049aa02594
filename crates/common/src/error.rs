//! Error types for pitchlane.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Machine-readable reason attached to a [`Denial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The actor's account type may not perform the action.
    AccountType,
    /// An investor must be approved first.
    VerificationRequired,
    /// The action needs an active premium tier.
    PremiumRequired,
    /// A block exists between the two users.
    Blocked,
    /// The recipient only accepts messages from people they follow.
    MessagingRestricted,
    /// The conversation is still an unanswered request.
    ConversationPending,
    /// The conversation is blocked.
    ConversationBlocked,
    /// The requested conversation transition is not allowed from the current state.
    InvalidTransition,
    /// Daily posting cap reached.
    DailyPostLimit,
    /// The content type is not allowed for this account type.
    ContentTypeRestricted,
    /// The content's visibility class excludes the viewer.
    VisibilityRestricted,
    /// The actor is not the owner of the target.
    NotOwner,
    /// The actor is not a participant of the conversation.
    NotParticipant,
    /// The account is deactivated.
    Inactive,
    /// Only moderators may perform the action.
    ModeratorOnly,
    /// The action does not apply to the given target.
    Unsupported,
}

/// What the user can do to lift a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    Upgrade,
    Verify,
    Follow,
    WaitForAcceptance,
}

/// A permission-gate refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub reason: DenialReason,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<Hint>,
}

impl Denial {
    /// Create a denial without a hint.
    #[must_use]
    pub fn new(reason: DenialReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a hint.
    #[must_use]
    pub const fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(Denial),

    #[error("Quota exceeded: {message}")]
    QuotaExceeded {
        message: String,
        resets_at: DateTime<Utc>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Returns the denial behind a `Forbidden` error.
    #[must_use]
    pub const fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Forbidden(denial) => Some(denial),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });

        match &self {
            Self::Forbidden(denial) => {
                error["reason"] = json!(denial.reason);
                if let Some(hint) = denial.hint {
                    error["hint"] = json!(hint);
                }
            }
            Self::QuotaExceeded { resets_at, .. } => {
                error["resetsAt"] = json!(resets_at);
            }
            _ => {}
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

// === From implementations ===

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        Self::Forbidden(denial)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_carries_reason_and_hint() {
        let err: AppError = Denial::new(
            DenialReason::VerificationRequired,
            "Verify your profile to comment.",
        )
        .with_hint(Hint::Verify)
        .into();

        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Forbidden: Verify your profile to comment.");
        let denial = err.denial().cloned();
        assert_eq!(
            denial.map(|d| (d.reason, d.hint)),
            Some((DenialReason::VerificationRequired, Some(Hint::Verify)))
        );
    }

    #[test]
    fn test_quota_exceeded_is_client_error() {
        let err = AppError::QuotaExceeded {
            message: "Monthly limit reached".to_string(),
            resets_at: Utc::now(),
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error_code(), "QUOTA_EXCEEDED");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_database_error_is_server_error() {
        let err = AppError::Database("connection reset".to_string());
        assert!(err.is_server_error());
        assert!(err.denial().is_none());
    }
}

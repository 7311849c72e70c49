//! Error types for daybook
//!
//! Internal failures are `thiserror` enums. Anything shown to a user is
//! converted into a [`Notice`], which carries:
//! - A stable error code for the UI layer
//! - A user-friendly message
//! - Optional internal detail for logging
//! - A retry hint

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::validation::ValidationError;

/// Malformed data received from the backend. Recovered locally, never shown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("malformed JSON: {0}")]
    Json(String),
    #[error("empty response for {0}")]
    EmptyBody(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// Every request shape failed (connection error or non-2xx status).
    Network,
    /// The addressed record does not exist (404 on every attempt).
    NotFound,
    /// A success response whose body could not be interpreted.
    Decode,
}

/// Failure reported across the [`crate::backend::ReportBackend`] seam.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Decode,
            message: message.into(),
        }
    }
}

/// Illegal draft transitions and addressing mistakes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("no report is loaded for editing")]
    NothingLoaded,
    #[error("cannot {action} while the draft is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("row {index} does not exist (draft has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("edit confirmation did not match")]
    ConfirmationRejected,
    #[error("report has no id and cannot be saved")]
    MissingRecordId,
    #[error("`{field}` holds entries that cannot be edited here")]
    UneditableItems { field: String },
}

/// Error categories for grouping and UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed dates or JSON
    Parse,
    /// Connection failures and non-2xx responses
    Network,
    /// Blocked before reaching the server
    Validation,
    /// Record vanished underneath an update
    Conflict,
    /// Operation not allowed in the current UI state
    State,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Network => write!(f, "network"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::State => write!(f, "state"),
        }
    }
}

/// Stable error codes for UI handling
/// Format: CATEGORY_SPECIFIC_ERROR
pub struct ErrorCode;

impl ErrorCode {
    pub const PARSE_MALFORMED_RESPONSE: &'static str = "PARSE_MALFORMED_RESPONSE";
    pub const NETWORK_ATTEMPTS_EXHAUSTED: &'static str = "NETWORK_ATTEMPTS_EXHAUSTED";
    pub const VALIDATION_MISSING_REMEDIATION: &'static str = "VALIDATION_MISSING_REMEDIATION";
    pub const CONFLICT_RECORD_MISSING: &'static str = "CONFLICT_RECORD_MISSING";
    pub const STATE_INVALID_TRANSITION: &'static str = "STATE_INVALID_TRANSITION";
    pub const STATE_CONFIRMATION_REJECTED: &'static str = "STATE_CONFIRMATION_REJECTED";
    pub const STATE_UNKNOWN_DAY: &'static str = "STATE_UNKNOWN_DAY";
    pub const STATE_UNKNOWN_RECORD: &'static str = "STATE_UNKNOWN_RECORD";
}

/// Transient, dismissible message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Stable error code for UI handling
    pub code: String,
    /// User-friendly error message
    pub message: String,
    /// Optional internal details for logging (not shown to user)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    pub category: ErrorCategory,
}

impl Notice {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        category: ErrorCategory,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: None,
            retryable: false,
            category,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn unknown_day(label: &str) -> Self {
        Self::new(
            ErrorCode::STATE_UNKNOWN_DAY,
            format!("No reports recorded for {label}"),
            ErrorCategory::State,
        )
    }

    pub fn unknown_record(id: &str) -> Self {
        Self::new(
            ErrorCode::STATE_UNKNOWN_RECORD,
            format!("Report not found: {id}"),
            ErrorCategory::State,
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Notice {}

impl From<BackendError> for Notice {
    fn from(e: BackendError) -> Self {
        match e.kind {
            BackendErrorKind::Network => Self::new(
                ErrorCode::NETWORK_ATTEMPTS_EXHAUSTED,
                "Could not reach the report service",
                ErrorCategory::Network,
            )
            .with_detail(e.message)
            .retryable(),
            BackendErrorKind::NotFound => Self::new(
                ErrorCode::CONFLICT_RECORD_MISSING,
                "This report no longer exists on the server",
                ErrorCategory::Conflict,
            )
            .with_detail(e.message),
            BackendErrorKind::Decode => Self::new(
                ErrorCode::PARSE_MALFORMED_RESPONSE,
                "The report service returned an unreadable response",
                ErrorCategory::Parse,
            )
            .with_detail(e.message)
            .retryable(),
        }
    }
}

impl From<DraftError> for Notice {
    fn from(e: DraftError) -> Self {
        match e {
            DraftError::ConfirmationRejected => Self::new(
                ErrorCode::STATE_CONFIRMATION_REJECTED,
                "Confirmation phrase is incorrect",
                ErrorCategory::State,
            ),
            other => Self::new(
                ErrorCode::STATE_INVALID_TRANSITION,
                other.to_string(),
                ErrorCategory::State,
            ),
        }
    }
}

impl From<ValidationError> for Notice {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::MissingRemediation { row, field, message } => Self::new(
                ErrorCode::VALIDATION_MISSING_REMEDIATION,
                message,
                ErrorCategory::Validation,
            )
            .with_detail(format!("row {row} is missing `{field}`")),
        }
    }
}

//! Error types for promptops.
//!
//! This module defines a unified error enum covering configuration, local
//! validation, remote service, I/O and serialization failures. Every remote
//! failure (transport, timeout, non-2xx response, synthesized document
//! rejection) is normalized into a single [`ApiError`] shape so callers can
//! branch on `kind`/`code`/`status` instead of on transport exceptions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error code used for connection, DNS and other transport failures.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Error code used when a request exceeds the timeout ceiling.
pub const TIMEOUT_ERROR_CODE: &str = "TIMEOUT";

/// Error code synthesized after a publish failure was attributed to documents.
pub const DOCUMENT_VALIDATION_FAILED: &str = "DOCUMENT_VALIDATION_FAILED";

/// HTTP-like status carried by [`ApiErrorKind::DocumentValidation`] errors.
pub const DOCUMENT_VALIDATION_STATUS: u16 = 422;

/// Category of a normalized remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection, DNS or transport failure (status 0)
    Network,
    /// Request exceeded the timeout ceiling (status 0)
    Timeout,
    /// Non-2xx response from the remote service
    Remote,
    /// Publish rejection attributed to specific documents
    DocumentValidation,
}

/// Normalized remote error shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,

    /// Machine-readable error code (e.g. `NETWORK_ERROR`, `HTTP_404`)
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// HTTP status, or 0 when no response was received
    pub status: u16,

    /// Optional structured details from the remote body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Transport-level failure. Carries no HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            code: NETWORK_ERROR_CODE.to_string(),
            message: message.into(),
            status: 0,
            details: None,
        }
    }

    /// Request aborted after the timeout ceiling.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Timeout,
            code: TIMEOUT_ERROR_CODE.to_string(),
            message: message.into(),
            status: 0,
            details: None,
        }
    }

    /// Non-2xx response from the remote service.
    pub fn remote(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Remote,
            code: code.into(),
            message: message.into(),
            status,
            details: None,
        }
    }

    /// Enriched error raised once a publish failure has been localized.
    pub fn document_validation(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::DocumentValidation,
            code: DOCUMENT_VALIDATION_FAILED.to_string(),
            message: message.into(),
            status: DOCUMENT_VALIDATION_STATUS,
            details: None,
        }
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether the remote service actually answered (as opposed to a
    /// transport failure or timeout).
    pub fn is_remote(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::Remote | ApiErrorKind::DocumentValidation
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == 0 {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            write!(f, "[{} {}] {}", self.status, self.code, self.message)
        }
    }
}

impl std::error::Error for ApiError {}

/// Unified error type for promptops.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration (credentials, project id, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local static validation rejected one or more documents
    #[error("Validation error: {0}")]
    Validation(String),

    /// Normalized remote service error
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// The normalized remote error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            AppError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Stable machine code for any error kind.
    pub fn code(&self) -> &str {
        match self {
            AppError::Config(_) => "CONFIGURATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Api(err) => &err.code,
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Other(_) => "UNKNOWN_ERROR",
        }
    }

    /// HTTP-like status. Local errors report 0.
    pub fn status(&self) -> u16 {
        match self {
            AppError::Api(err) => err.status,
            _ => 0,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

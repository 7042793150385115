//! Application-wide error model.
//!
//! Component crates define their own `thiserror` enums and convert into
//! [`AppError`] at the crate boundary. Only the `validation` kind is ever
//! surfaced to clients; every other kind is absorbed by a component's
//! degradation policy and logged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure kinds recognized by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    LlmUnavailable,
    LlmSchema,
    WarehouseUnavailable,
    MetadataUnavailable,
    CacheUnavailable,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::LlmUnavailable => "llm_unavailable",
            ErrorKind::LlmSchema => "llm_schema",
            ErrorKind::WarehouseUnavailable => "warehouse_unavailable",
            ErrorKind::MetadataUnavailable => "metadata_unavailable",
            ErrorKind::CacheUnavailable => "cache_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error carrying a [`ErrorKind`] and a human-readable message.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn llm_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LlmUnavailable, message)
    }

    pub fn llm_schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LlmSchema, message)
    }

    pub fn warehouse_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WarehouseUnavailable, message)
    }

    pub fn metadata_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MetadataUnavailable, message)
    }

    pub fn cache_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CacheUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// True when the error must be shown to the caller instead of degraded.
    pub fn is_user_visible(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

/// Result alias for operations returning [`AppError`].
pub type AppResult<T> = std::result::Result<T, AppError>;

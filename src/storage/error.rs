//! Storage Errors
//!
//! TigerStyle: Explicit error types with context.

use thiserror::Error;

/// Errors from storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Missing or invalid connection settings, or an unknown backend tag
    #[error("configuration error: {message}")]
    Configuration {
        /// What is missing or invalid
        message: String,
    },

    /// Backend unreachable or handshake rejected
    #[error("connection error: {message}")]
    Connection {
        /// Connection error message
        message: String,
    },

    /// Operation issued before `connect()` (or after `disconnect()`)
    #[error("database not connected")]
    NotConnected,

    /// Required field missing or a write rejected by a constraint
    #[error("validation error: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// Update target does not resolve
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind (`category` or `link`)
        kind: &'static str,
        /// ID that was not found
        id: String,
    },

    /// Any other backend-native failure
    #[error("query error: {message}")]
    Query {
        /// Query error message
        message: String,
    },

    /// Internal error (row or document mapping)
    #[error("internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a query error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a transient error (caller may retry with backoff).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::NotConnected)
    }

    /// Check if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

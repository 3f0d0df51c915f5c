// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for runway-core.
//!
//! Provides a unified error type with stable error-code strings that the
//! HTTP layer maps onto responses.

use std::fmt;

/// Result type using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur during run-ID allocation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CoreError {
    /// A task-ID string did not match the canonical format.
    InvalidTaskId {
        /// The rejected input.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Database operation failed.
    DatabaseError {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl CoreError {
    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTaskId { .. } => "INVALID_TASK_ID",
            Self::DatabaseError { .. } => "DATABASE_ERROR",
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTaskId { value, reason } => {
                write!(f, "Invalid task ID '{}': {}", value, reason)
            }
            Self::DatabaseError { operation, details } => {
                write!(f, "Database error during '{}': {}", operation, details)
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::DatabaseError {
            operation: "query".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CoreError::InvalidTaskId {
                value: "x".to_string(),
                reason: "too short".to_string(),
            }
            .error_code(),
            "INVALID_TASK_ID"
        );
        assert_eq!(
            CoreError::DatabaseError {
                operation: "increment".to_string(),
                details: "connection refused".to_string(),
            }
            .error_code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidTaskId {
            value: "TASK25".to_string(),
            reason: "expected 18 characters".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid task ID 'TASK25': expected 18 characters"
        );

        let err = CoreError::DatabaseError {
            operation: "increment".to_string(),
            details: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Database error during 'increment': connection refused"
        );
    }
}

// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for runway-server.
//!
//! `ApiError` is the single error type all handlers return; its
//! `IntoResponse` impl renders the `{ error, details }` JSON body the UI
//! expects.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result type using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;

/// API errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Request validation failed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that missed.
        id: String,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Run-ID allocation failed.
    #[error("Allocator error: {0}")]
    Core(#[from] runway_core::CoreError),

    /// The AWX API rejected a request or was unreachable.
    #[error("AWX error: {0}")]
    Awx(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Core(_) | Self::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Awx(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short, user-facing summary; the full Display string goes in `details`.
    fn summary(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => msg.clone(),
            Self::NotFound { entity, id } => format!("{} not found: {}", entity, id),
            Self::Database(_) => "Database operation failed".to_string(),
            Self::Core(_) => "Failed to allocate task ID".to_string(),
            Self::Awx(_) => "AWX request failed".to_string(),
            Self::Json(_) => "Invalid JSON payload".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            // Validation and not-found summaries already carry the detail.
            Self::InvalidRequest(_) | Self::NotFound { .. } => None,
            _ => Some(self.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.summary(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound {
                entity: "Catalog item",
                id: "x".into()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Awx("boom".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Core(runway_core::CoreError::DatabaseError {
                operation: "increment".into(),
                details: "down".into(),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = ApiError::NotFound {
            entity: "Catalog item",
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "Catalog item not found: abc");
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// More than one record matched a lookup that must be unique.
    #[error("Ambiguous match: {0}")]
    Ambiguous(String),

    /// A conditional write lost against a concurrent writer.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    /// An external collaborator (history, geocoding, messaging) failed.
    #[error("{message}: {source}")]
    Upstream {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Coarse classification used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Upstream,
    Internal,
}

impl ErrorClass {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
            ErrorClass::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Wrap a collaborator failure with an operator-facing message.
    pub fn upstream(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Upstream {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Unauthorized => ErrorClass::Unauthorized,
            AppError::BadRequest(_) => ErrorClass::BadRequest,
            AppError::NotFound(_) => ErrorClass::NotFound,
            AppError::Conflict(_) => ErrorClass::Conflict,
            AppError::Upstream { .. } => ErrorClass::Upstream,
            AppError::Ambiguous(_) | AppError::Database(_) | AppError::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// Whether a later redelivery of the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_) | AppError::Upstream { .. })
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let class = self.class();
        let (error, details) = match &self {
            AppError::Unauthorized => ("unauthorized", None),
            AppError::BadRequest(msg) => ("bad_request", Some(msg.clone())),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::Conflict(msg) => ("conflict", Some(msg.clone())),
            AppError::Upstream { message, source } => {
                tracing::warn!(error = %source, message = %message, "Upstream failure");
                ("upstream_error", Some(message.clone()))
            }
            AppError::Ambiguous(msg) => {
                tracing::error!(error = %msg, "Data integrity fault");
                ("ambiguous_match", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (class.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_maps_to_status() {
        assert_eq!(
            AppError::BadRequest("x".into()).class().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).class().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::upstream("send failed", anyhow::anyhow!("boom"))
                .class()
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Database("x".into()).class().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Conflict("x".into()).class().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_ambiguous_is_internal_and_not_retryable() {
        let err = AppError::Ambiguous("2 users".into());
        assert_eq!(err.class(), ErrorClass::Internal);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_upstream_keeps_cause() {
        use std::error::Error as _;

        let err = AppError::upstream("Error sending text message", anyhow::anyhow!("HTTP 500"));
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("Error sending text message"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("HTTP 500".into()));
    }

    #[test]
    fn test_into_response_uses_class_status() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::Conflict("stale".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Fitbit client id/secret are not configured.
    #[error("Server misconfiguration")]
    Misconfigured,

    /// A Fitbit call failed; relayed to the caller with its status and body.
    #[error("Fitbit upstream error ({status}): {error}")]
    Upstream {
        status: u16,
        error: String,
        details: Option<Value>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this is an upstream 401 (expired or revoked access token).
    pub fn is_unauthorized_upstream(&self) -> bool {
        matches!(self, AppError::Upstream { status: 401, .. })
    }

    /// Whether Fitbit refused the request itself (4xx), as opposed to an
    /// outage, a network failure or an unreadable body.
    pub fn is_rejected_upstream(&self) -> bool {
        matches!(self, AppError::Upstream { status: 400..=499, .. })
    }

    /// Upstream status, if this error came from Fitbit.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), None),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "not_found".to_string(),
                Some(Value::String(msg)),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Misconfigured => {
                tracing::error!("Missing Fitbit client credentials");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server misconfiguration".to_string(),
                    None,
                )
            }
            AppError::Upstream {
                status,
                error,
                details,
            } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, error, details)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

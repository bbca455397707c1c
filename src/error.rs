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
    #[error("Invalid API key")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    /// The activity API rejected the access token (HTTP 401).
    #[error("Strava API error: access token rejected")]
    StravaUnauthorized,

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Journal source error: {0}")]
    Sheets(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the activity API refused the token and a refresh may help.
    pub fn is_strava_token_error(&self) -> bool {
        matches!(self, AppError::StravaUnauthorized)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
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
        let (status, error) = match &self {
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::StravaUnauthorized | AppError::StravaApi(_) => {
                tracing::error!(error = %self, "Strava API failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "strava_error")
            }
            AppError::Sheets(_) => {
                tracing::error!(error = %self, "Journal source failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "journal_error")
            }
            AppError::Credentials(_) => {
                tracing::error!(error = %self, "Credential store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "credentials_error")
            }
            AppError::Database(_) => {
                tracing::error!(error = %self, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        // The caller sees the error text but never a backtrace.
        let details = match &self {
            AppError::Unauthorized => None,
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret API key middleware for the webhook endpoints.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests whose `X-API-KEY` doesn't match the configured key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|h| h.as_bytes())
        .unwrap_or_default();

    let expected = state.config.api_key.as_bytes();
    if expected.is_empty() || !bool::from(provided.ct_eq(expected)) {
        tracing::warn!(
            path = %request.uri().path(),
            present = !provided.is_empty(),
            "Rejected request with invalid API key"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

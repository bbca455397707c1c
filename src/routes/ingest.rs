// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wearable export webhook.

use crate::error::{AppError, Result};
use crate::services::sync::ingest_health_export;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Exports are far larger than axum's 2 MB default body limit.
pub fn routes(max_body_bytes: usize) -> Router<Arc<AppState>> {
    Router::new().route(
        "/ingest",
        post(ingest).layer(DefaultBodyLimit::max(max_body_bytes)),
    )
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub metrics_saved: u64,
    pub runs_saved: u64,
}

/// Receive one export document and persist what it contains.
async fn ingest(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })?;
    let report = ingest_health_export(&state.db, &payload).await?;

    Ok(Json(IngestResponse {
        status: "success",
        metrics_saved: report.metrics_saved,
        runs_saved: report.runs_saved,
    }))
}

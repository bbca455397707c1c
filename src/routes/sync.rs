// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync triggers. Each source has its own lock, so a second trigger for a
//! source waits for the running sync instead of racing it.

use super::StatusResponse;
use crate::error::{AppError, Result};
use crate::models::run::SOURCE_STRAVA;
use crate::services::sync;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

const JOURNAL_LOCK: &str = "journal";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/strava", post(sync_strava))
        .route("/sync/journal", post(sync_journal))
}

async fn sync_strava(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    let lock = state.sync_lock(SOURCE_STRAVA);
    let _guard = lock.lock().await;

    tracing::info!("Strava sync triggered");
    let report = sync::sync_strava(
        &state.db,
        state.activity_api.as_ref(),
        state.credentials.as_ref(),
        &state.config,
    )
    .await?;

    Ok(Json(StatusResponse {
        status: "success",
        message: report.message(),
    }))
}

async fn sync_journal(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    let source = state.journal_source.clone().ok_or_else(|| {
        AppError::BadRequest("Journal spreadsheet is not configured".to_string())
    })?;

    let lock = state.sync_lock(JOURNAL_LOCK);
    let _guard = lock.lock().await;

    tracing::info!("Journal sync triggered");
    let report = sync::sync_journal(&state.db, source.as_ref()).await?;

    Ok(Json(StatusResponse {
        status: "success",
        message: report.message(),
    }))
}

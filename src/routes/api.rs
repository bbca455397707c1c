// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Corrections and summary routes.

use crate::error::{AppError, Result};
use crate::models::{ManualCorrection, Summary};
use crate::services::corrections::{record_correction, CorrectionRequest};
use crate::services::summary::build_summary;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require the API key, applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/corrections/pending", get(pending_corrections))
        .route("/corrections/{run_id}", post(submit_correction))
        .route("/summary", get(get_summary))
}

// ─── Corrections ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct CorrectionResponse {
    /// "created", or "exists" when an earlier correction was kept
    pub status: &'static str,
    pub correction: ManualCorrection,
}

async fn submit_correction(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Json(request): Json<CorrectionRequest>,
) -> Result<(StatusCode, Json<CorrectionResponse>)> {
    let outcome = record_correction(&state.db, &run_id, request).await?;

    let (status, label) = if outcome.created {
        (StatusCode::CREATED, "created")
    } else {
        (StatusCode::OK, "exists")
    };
    Ok((
        status,
        Json(CorrectionResponse {
            status: label,
            correction: outcome.correction,
        }),
    ))
}

#[derive(Serialize)]
pub struct PendingRun {
    pub run_id: String,
    pub date: NaiveDateTime,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub avg_hr: Option<f64>,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub count: usize,
    pub runs: Vec<PendingRun>,
}

/// Indoor runs still waiting for a manual correction.
async fn pending_corrections(State(state): State<Arc<AppState>>) -> Result<Json<PendingResponse>> {
    let runs: Vec<PendingRun> = state
        .db
        .uncorrected_indoor_runs()
        .await?
        .into_iter()
        .map(|run| PendingRun {
            run_id: run.external_id,
            date: run.date,
            distance_km: run.distance_km,
            duration_min: run.duration_min,
            avg_hr: run.avg_hr,
        })
        .collect();

    Ok(Json(PendingResponse {
        count: runs.len(),
        runs,
    }))
}

// ─── Summary ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct SummaryQuery {
    /// Baseline window in days
    #[serde(default = "default_days")]
    days: u32,
    /// Number of recent runs
    #[serde(default = "default_runs")]
    runs: u32,
}

fn default_days() -> u32 {
    30
}
fn default_runs() -> u32 {
    10
}

const MAX_DAYS: u32 = 365;
const MAX_RUNS: u32 = 100;

async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<Summary>> {
    if params.days < 1 || params.days > MAX_DAYS {
        return Err(AppError::BadRequest(format!(
            "'days' must be between 1 and {}",
            MAX_DAYS
        )));
    }
    let runs = params.runs.min(MAX_RUNS);

    tracing::debug!(days = params.days, runs, "Building summary");
    Ok(Json(build_summary(&state.db, params.days, runs).await?))
}

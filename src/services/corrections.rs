// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Manual corrections for indoor runs, whose recorded distance comes from a
//! foot pod or treadmill guess rather than GPS.

use crate::db::{self, Database};
use crate::error::AppError;
use crate::models::{Interval, ManualCorrection, Run};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

const DEFAULT_SIMPLE_INTENSITY: u8 = 7;
const DEFAULT_INTERVAL_INTENSITY: u8 = 8;

/// Correction as submitted: either a distance/duration pair or a list of
/// intervals from which both are derived.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CorrectionRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub distance_km: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub duration_min: Option<f64>,
    #[validate(range(min = 1, max = 10))]
    pub intensity: Option<u8>,
    #[serde(default)]
    #[validate(length(max = 200), nested)]
    pub intervals: Vec<Interval>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Total distance (km, 2 dp) and duration (min, 1 dp) of a session.
pub fn interval_totals(intervals: &[Interval]) -> (f64, f64) {
    let (distance, minutes) = intervals.iter().fold((0.0, 0.0), |(d, m), i| {
        (
            d + i.distance_km,
            m + i.distance_km / i.speed_kmh * 60.0 + i.rest_sec / 60.0,
        )
    });
    (round_to(distance, 2), round_to(minutes, 1))
}

/// Validate a request and turn it into the stored record.
pub fn build_correction(
    run_id: &str,
    request: CorrectionRequest,
    now: DateTime<Utc>,
) -> Result<ManualCorrection, AppError> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (distance_km, duration_min, intensity) = if request.intervals.is_empty() {
        match (request.distance_km, request.duration_min) {
            (Some(distance), Some(duration)) => (
                distance,
                duration,
                request.intensity.unwrap_or(DEFAULT_SIMPLE_INTENSITY),
            ),
            _ => {
                return Err(AppError::BadRequest(
                    "Either distance_km and duration_min or intervals are required".to_string(),
                ))
            }
        }
    } else {
        let (distance, duration) = interval_totals(&request.intervals);
        (
            distance,
            duration,
            request.intensity.unwrap_or(DEFAULT_INTERVAL_INTENSITY),
        )
    };

    Ok(ManualCorrection {
        run_id: run_id.to_string(),
        distance_km,
        duration_min,
        intensity,
        intervals: request.intervals,
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        corrected_on: now,
    })
}

/// Overwrite distance and duration of runs that have a correction.
///
/// Returns how many runs were changed.
pub fn apply_overlay(runs: &mut [Run], corrections: &HashMap<String, ManualCorrection>) -> usize {
    let mut applied = 0;
    for run in runs.iter_mut() {
        if let Some(correction) = corrections.get(&run.external_id) {
            run.distance_km = Some(correction.distance_km);
            run.duration_min = Some(correction.duration_min);
            applied += 1;
        }
    }
    applied
}

/// Result of submitting a correction.
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    /// The stored correction (the earlier one if it already existed)
    pub correction: ManualCorrection,
    pub created: bool,
}

/// Store a correction for a persisted run and apply it to the run row.
///
/// A run that already has a correction keeps it; the request is ignored.
pub async fn record_correction(
    db: &Database,
    run_id: &str,
    request: CorrectionRequest,
) -> Result<CorrectionOutcome, AppError> {
    if db.get_run(run_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Run {} not found", run_id)));
    }
    let correction = build_correction(run_id, request, Utc::now())?;

    let mut tx = db.begin().await?;
    let created = db::corrections::insert_if_absent(&mut tx, &correction).await?;
    if created {
        db::runs::apply_correction(
            &mut tx,
            run_id,
            correction.distance_km,
            correction.duration_min,
        )
        .await?;
    }
    tx.commit().await?;

    if created {
        tracing::info!(
            run_id,
            distance_km = correction.distance_km,
            duration_min = correction.duration_min,
            "Correction recorded"
        );
        return Ok(CorrectionOutcome {
            correction,
            created,
        });
    }

    tracing::info!(run_id, "Run already corrected, keeping existing correction");
    let existing = db
        .get_correction(run_id)
        .await?
        .ok_or_else(|| AppError::Database(format!("Correction for {} vanished", run_id)))?;
    Ok(CorrectionOutcome {
        correction: existing,
        created,
    })
}

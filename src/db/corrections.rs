// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Manual correction storage. Corrections are write-once.

use super::Database;
use crate::error::AppError;
use crate::models::{Interval, ManualCorrection};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

/// Ids per `IN (...)` lookup.
const LOOKUP_BATCH: usize = 500;

fn correction_from_row(row: &SqliteRow) -> Result<ManualCorrection, AppError> {
    let intervals_json: String = row.try_get("intervals_json")?;
    let intervals: Vec<Interval> = serde_json::from_str(&intervals_json)
        .map_err(|e| AppError::Database(format!("Corrupt intervals_json: {}", e)))?;
    let corrected_on: String = row.try_get("corrected_on")?;
    let corrected_on = DateTime::parse_from_rfc3339(&corrected_on)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Corrupt corrected_on: {}", e)))?;
    let intensity: i64 = row.try_get("intensity")?;

    Ok(ManualCorrection {
        run_id: row.try_get("run_id")?,
        distance_km: row.try_get("distance_km")?,
        duration_min: row.try_get("duration_min")?,
        intensity: u8::try_from(intensity).unwrap_or(u8::MAX),
        intervals,
        notes: row.try_get("notes")?,
        corrected_on,
    })
}

/// Store a correction unless one already exists for the run.
///
/// Returns `false` when an earlier correction was kept.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    correction: &ManualCorrection,
) -> Result<bool, AppError> {
    let intervals_json = serde_json::to_string(&correction.intervals)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Interval serialization: {}", e)))?;

    let result = sqlx::query(
        r"
        INSERT INTO manual_corrections (
            run_id, distance_km, duration_min, intensity, intervals_json, notes, corrected_on
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(run_id) DO NOTHING
        ",
    )
    .bind(&correction.run_id)
    .bind(correction.distance_km)
    .bind(correction.duration_min)
    .bind(i64::from(correction.intensity))
    .bind(intervals_json)
    .bind(&correction.notes)
    .bind(correction.corrected_on.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Corrections for the given run ids, keyed by run id.
pub async fn load_for_runs(
    conn: &mut SqliteConnection,
    run_ids: &[String],
) -> Result<HashMap<String, ManualCorrection>, AppError> {
    let mut found = HashMap::new();
    for chunk in run_ids.chunks(LOOKUP_BATCH) {
        let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT run_id, distance_km, duration_min, intensity, intervals_json, notes, corrected_on \
             FROM manual_corrections WHERE run_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in chunk {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&mut *conn).await?;
        for row in &rows {
            let correction = correction_from_row(row)?;
            found.insert(correction.run_id.clone(), correction);
        }
    }
    Ok(found)
}

impl Database {
    /// Get the correction recorded for a run, if any.
    pub async fn get_correction(&self, run_id: &str) -> Result<Option<ManualCorrection>, AppError> {
        let row = sqlx::query(
            r"
            SELECT run_id, distance_km, duration_min, intensity, intervals_json, notes, corrected_on
            FROM manual_corrections
            WHERE run_id = ?1
            ",
        )
        .bind(run_id)
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(correction_from_row).transpose()
    }
}

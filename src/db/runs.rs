// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run storage: snapshot reads, cursor lookup and upserts.

use super::Database;
use crate::error::AppError;
use crate::models::{Run, RunSummary};
use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

const RUN_COLUMNS: &str = "external_id, date, distance_km, duration_min, avg_hr, max_hr, \
                           energy_kcal, source, route_json, indoor";

fn run_from_row(row: &SqliteRow) -> Result<Run, sqlx::Error> {
    let route_json: Option<String> = row.try_get("route_json")?;
    Ok(Run {
        external_id: row.try_get("external_id")?,
        date: row.try_get("date")?,
        distance_km: row.try_get("distance_km")?,
        duration_min: row.try_get("duration_min")?,
        avg_hr: row.try_get("avg_hr")?,
        max_hr: row.try_get("max_hr")?,
        energy_kcal: row.try_get("energy_kcal")?,
        source: row.try_get("source")?,
        route: route_json.and_then(|s| serde_json::from_str(&s).ok()),
        indoor: row.try_get("indoor")?,
    })
}

/// Load every stored run for `source`, keyed by identity.
///
/// One query per sync; reconciliation then tests membership in memory.
pub async fn load_snapshot(
    conn: &mut SqliteConnection,
    source: &str,
) -> Result<HashMap<String, Run>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM runs WHERE source = ?1",
        RUN_COLUMNS
    ))
    .bind(source)
    .fetch_all(&mut *conn)
    .await?;

    let mut snapshot = HashMap::with_capacity(rows.len());
    for row in &rows {
        let run = run_from_row(row)?;
        snapshot.insert(run.external_id.clone(), run);
    }
    Ok(snapshot)
}

/// Insert-or-update each run on `external_id`; last write wins.
pub async fn upsert_runs(conn: &mut SqliteConnection, runs: &[Run]) -> Result<u64, AppError> {
    let mut written = 0;
    for run in runs {
        let route_json = run
            .route
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Route serialization: {}", e)))?;

        let result = sqlx::query(
            r"
            INSERT INTO runs (
                external_id, date, distance_km, duration_min, avg_hr, max_hr,
                energy_kcal, source, route_json, indoor
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(external_id) DO UPDATE SET
                date = excluded.date,
                distance_km = excluded.distance_km,
                duration_min = excluded.duration_min,
                avg_hr = excluded.avg_hr,
                max_hr = excluded.max_hr,
                energy_kcal = excluded.energy_kcal,
                source = excluded.source,
                route_json = excluded.route_json,
                indoor = excluded.indoor,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(&run.external_id)
        .bind(run.date)
        .bind(run.distance_km)
        .bind(run.duration_min)
        .bind(run.avg_hr)
        .bind(run.max_hr)
        .bind(run.energy_kcal)
        .bind(&run.source)
        .bind(route_json)
        .bind(run.indoor)
        .execute(&mut *conn)
        .await?;

        written += result.rows_affected();
    }
    Ok(written)
}

/// Overwrite distance and duration of one stored run.
pub async fn apply_correction(
    conn: &mut SqliteConnection,
    external_id: &str,
    distance_km: f64,
    duration_min: f64,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r"
        UPDATE runs
        SET distance_km = ?2, duration_min = ?3, updated_at = CURRENT_TIMESTAMP
        WHERE external_id = ?1
        ",
    )
    .bind(external_id)
    .bind(distance_km)
    .bind(duration_min)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

impl Database {
    /// Sync cursor: start of the newest stored run tagged with `source`.
    pub async fn latest_run_date(&self, source: &str) -> Result<Option<NaiveDateTime>, AppError> {
        let latest = sqlx::query_scalar::<_, NaiveDateTime>(
            "SELECT date FROM runs WHERE source = ?1 ORDER BY date DESC LIMIT 1",
        )
        .bind(source)
        .fetch_optional(self.pool())
        .await?;
        Ok(latest)
    }

    /// Get a run by identity.
    pub async fn get_run(&self, external_id: &str) -> Result<Option<Run>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM runs WHERE external_id = ?1",
            RUN_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(run_from_row).transpose()?)
    }

    /// Total stored runs.
    pub async fn count_runs(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM runs")
            .fetch_one(self.pool())
            .await?)
    }

    /// Most recent runs across all sources, newest first.
    pub async fn recent_runs(&self, limit: u32) -> Result<Vec<RunSummary>, AppError> {
        let rows = sqlx::query(
            r"
            SELECT date, distance_km, duration_min, avg_hr, energy_kcal, source
            FROM runs
            ORDER BY date DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?;

        let mut runs = Vec::with_capacity(rows.len());
        for row in rows {
            runs.push(RunSummary {
                date: row.try_get("date")?,
                distance_km: row.try_get("distance_km")?,
                duration_min: row.try_get("duration_min")?,
                avg_hr: row.try_get("avg_hr")?,
                energy_kcal: row.try_get("energy_kcal")?,
                source: row.try_get("source")?,
            });
        }
        Ok(runs)
    }

    /// Indoor runs that have no manual correction yet, newest first.
    pub async fn uncorrected_indoor_runs(&self) -> Result<Vec<Run>, AppError> {
        let rows = sqlx::query(
            r"
            SELECT r.external_id, r.date, r.distance_km, r.duration_min, r.avg_hr, r.max_hr,
                   r.energy_kcal, r.source, r.route_json, r.indoor
            FROM runs r
            LEFT JOIN manual_corrections c ON c.run_id = r.external_id
            WHERE r.indoor = 1 AND c.run_id IS NULL
            ORDER BY r.date DESC
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .iter()
            .map(run_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One sync operation per source.
//!
//! Every entry point here opens a single transaction, and nothing is
//! committed unless the whole call succeeds. Callers are expected to
//! serialize syncs of the same source.

use crate::config::Config;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::models::run::{SOURCE_APPLE_HEALTH, SOURCE_STRAVA};
use crate::services::corrections::apply_overlay;
use crate::services::credentials::{CredentialStore, STRAVA_ACCESS_TOKEN};
use crate::services::fetch::{refresh_and_store, FetchCoordinator};
use crate::services::health_export::normalize_export;
use crate::services::journal::{build_column_map, normalize_rows, JournalSource};
use crate::services::reconcile::{classify_runs, dedupe_last_wins, merge_activity_batches};
use crate::services::strava::{normalize_activities, ActivityApi};
use crate::time_utils::unix_seconds;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;

// ─── Wearable export ─────────────────────────────────────────

/// Rows written by one export ingest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub metrics_saved: u64,
    pub runs_saved: u64,
}

/// Normalize an export document and persist it in one transaction.
///
/// Biometrics are conflict-ignored; runs are reconciled against what the
/// export source already stored.
pub async fn ingest_health_export(db: &Database, doc: &Value) -> Result<IngestReport, AppError> {
    let export = normalize_export(doc);
    tracing::info!(
        biometrics = export.biometrics.len(),
        runs = export.runs.len(),
        "Export normalized"
    );

    let mut tx = db.begin().await?;

    let metrics_saved = db::biometrics::insert_ignore(&mut tx, &export.biometrics).await?;

    let snapshot = db::runs::load_snapshot(&mut tx, SOURCE_APPLE_HEALTH).await?;
    let plan = classify_runs(export.runs, &snapshot);
    let runs_saved = db::runs::upsert_runs(&mut tx, &plan.writes()).await?;

    tx.commit().await?;

    tracing::info!(
        metrics_saved,
        metrics_ignored = export.biometrics.len() as u64 - metrics_saved,
        runs_saved,
        runs_unchanged = plan.unchanged,
        "Export ingested"
    );

    Ok(IngestReport {
        metrics_saved,
        runs_saved,
    })
}

// ─── Activity API ────────────────────────────────────────────

/// Outcome of one activity sync.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Raw activities returned by the API
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Runs whose figures came from a manual correction
    pub corrected: usize,
    /// Indoor runs in this batch still lacking a correction
    pub pending_corrections: usize,
}

impl SyncReport {
    /// Status line for the HTTP response.
    pub fn message(&self) -> String {
        if self.fetched == 0 {
            return "No new activities".to_string();
        }

        let mut message = format!(
            "Fetched {} activities: {} new runs, {} updated, {} unchanged",
            self.fetched, self.inserted, self.updated, self.unchanged
        );
        if self.corrected > 0 {
            message.push_str(&format!("; {} with manual corrections", self.corrected));
        }
        if self.pending_corrections > 0 {
            message.push_str(&format!(
                "; {} indoor runs awaiting correction",
                self.pending_corrections
            ));
        }
        message
    }
}

/// Attach the partial-progress count to a fetch failure.
fn fetch_failure(err: AppError, fetched: usize) -> AppError {
    let context = format!("{} activities fetched before failure", fetched);
    match err {
        AppError::StravaUnauthorized => AppError::StravaApi(format!(
            "access token rejected after refresh ({})",
            context
        )),
        AppError::StravaApi(msg) => AppError::StravaApi(format!("{} ({})", msg, context)),
        AppError::Credentials(msg) => AppError::Credentials(format!("{} ({})", msg, context)),
        other => other,
    }
}

/// Pull new activities, normalize them and upsert the runs.
pub async fn sync_strava(
    db: &Database,
    api: &dyn ActivityApi,
    credentials: &dyn CredentialStore,
    config: &Config,
) -> Result<SyncReport, AppError> {
    let access_token = match credentials.get(STRAVA_ACCESS_TOKEN).await? {
        Some(token) => token,
        None => {
            tracing::info!("No stored access token, refreshing first");
            refresh_and_store(api, credentials).await?
        }
    };

    let cursor = db.latest_run_date(SOURCE_STRAVA).await?;
    match cursor {
        Some(latest) => tracing::info!(%latest, "Incremental sync"),
        None => tracing::info!("No stored runs, fetching full history"),
    }

    let outcome = FetchCoordinator::new(api, credentials, config.strava_page_size)
        .fetch_all(access_token, cursor.map(unix_seconds))
        .await;
    if let Some(err) = outcome.error {
        return Err(fetch_failure(err, outcome.activities.len()));
    }

    let fetched = outcome.activities.len();
    let raw = merge_activity_batches(Vec::new(), outcome.activities);
    let mut runs = normalize_activities(&raw);

    let mut tx = db.begin().await?;

    let run_ids: Vec<String> = runs.iter().map(|r| r.external_id.clone()).collect();
    let corrections = db::corrections::load_for_runs(&mut tx, &run_ids).await?;
    let corrected = apply_overlay(&mut runs, &corrections);
    let pending_corrections = runs
        .iter()
        .filter(|r| r.indoor && !corrections.contains_key(&r.external_id))
        .count();
    let normalized = runs.len();

    let snapshot = db::runs::load_snapshot(&mut tx, SOURCE_STRAVA).await?;
    let plan = classify_runs(runs, &snapshot);
    let saved = db::runs::upsert_runs(&mut tx, &plan.writes()).await?;

    if let Some(path) = &config.activity_archive_path {
        archive_activities(path, raw).await?;
    }

    tx.commit().await?;

    let report = SyncReport {
        fetched,
        inserted: plan.new.len(),
        updated: plan.changed.len(),
        unchanged: plan.unchanged,
        corrected,
        pending_corrections,
    };
    tracing::info!(
        fetched,
        runs = normalized,
        saved,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        corrected,
        pending_corrections,
        "Strava sync complete"
    );
    Ok(report)
}

fn archive_error(path: &Path, action: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "Failed to {} activity archive {}: {}",
        action,
        path.display(),
        e
    ))
}

/// Merge fetched raw activities into the JSON archive at `path`.
///
/// Returns the number of activities the archive holds afterwards.
pub async fn archive_activities(path: &Path, fetched: Vec<Value>) -> Result<usize, AppError> {
    let previous: Vec<Value> = match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| archive_error(path, "parse", e))?,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(archive_error(path, "read", e)),
    };

    let merged = merge_activity_batches(previous, fetched);
    let bytes = serde_json::to_vec(&merged).map_err(|e| archive_error(path, "encode", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| archive_error(path, "create directory for", e))?;
    }
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| archive_error(path, "write", e))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| archive_error(path, "replace", e))?;

    tracing::debug!(path = %path.display(), total = merged.len(), "Activity archive updated");
    Ok(merged.len())
}

// ─── Journal ─────────────────────────────────────────────────

/// Outcome of one journal sync.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JournalReport {
    pub rows: usize,
    pub saved: u64,
    pub skipped: usize,
    /// No header matched "Date"; nothing was written
    pub missing_date_column: bool,
}

impl JournalReport {
    pub fn message(&self) -> String {
        if self.missing_date_column {
            "Journal sync aborted: no Date column found".to_string()
        } else if self.rows == 0 {
            "Journal is empty".to_string()
        } else {
            format!(
                "Journal sync complete: {} entries saved, {} rows skipped",
                self.saved, self.skipped
            )
        }
    }
}

/// Read the journal and upsert every dated row.
pub async fn sync_journal(db: &Database, source: &dyn JournalSource) -> Result<JournalReport, AppError> {
    let rows = source.fetch_rows().await?;
    let Some(first) = rows.first() else {
        return Ok(JournalReport::default());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let Some(columns) = build_column_map(&headers) else {
        tracing::error!(?headers, "Journal has no Date column");
        return Ok(JournalReport {
            rows: rows.len(),
            missing_date_column: true,
            ..Default::default()
        });
    };

    let entries = normalize_rows(&rows, &columns);
    let skipped = rows.len() - entries.len();
    let entries = dedupe_last_wins(entries, |e| e.date);

    let mut tx = db.begin().await?;
    let saved = db::journal::upsert_entries(&mut tx, &entries).await?;
    tx.commit().await?;

    tracing::info!(rows = rows.len(), saved, skipped, "Journal synced");
    Ok(JournalReport {
        rows: rows.len(),
        saved,
        skipped,
        missing_date_column: false,
    })
}

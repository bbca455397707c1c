// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalizer for wearable health exports.
//!
//! The export app has shipped several document layouts over time:
//! - `{"metrics": [...], "workouts": [...]}`
//! - `{"data": {"metrics": [...], "workouts": [...]}}`
//! - `{"data": [...]}` (a bare metrics list)
//!
//! [`resolve_shape`] picks the layout once; everything after it works on a
//! plain list. Malformed entries are skipped one by one and never fail the
//! document.

use crate::models::run::SOURCE_APPLE_HEALTH;
use crate::models::{Biometric, Run};
use crate::time_utils::{parse_utc_naive, truncate_to_seconds, unix_seconds};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

/// Workout name kept by the normalizer; everything else is dropped.
pub const RUNNING_WORKOUT: &str = "Running";

/// Nested container key used by newer export versions.
const DATA_KEY: &str = "data";

/// Logical list requested from an export document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Metrics,
    Workouts,
}

impl RecordKind {
    pub fn key(self) -> &'static str {
        match self {
            RecordKind::Metrics => "metrics",
            RecordKind::Workouts => "workouts",
        }
    }
}

/// Where in the document the requested list lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportShape<'a> {
    /// `doc[kind]`
    TopLevel(&'a [Value]),
    /// `doc["data"][kind]`
    Nested(&'a [Value]),
    /// `doc["data"]` is itself the metrics list
    BareList(&'a [Value]),
    Unrecognized,
}

impl<'a> ExportShape<'a> {
    /// The resolved list, empty when unrecognized.
    pub fn entries(self) -> &'a [Value] {
        match self {
            ExportShape::TopLevel(list) | ExportShape::Nested(list) | ExportShape::BareList(list) => {
                list
            }
            ExportShape::Unrecognized => &[],
        }
    }
}

/// Locate the list for `kind` in any of the known layouts.
pub fn resolve_shape(doc: &Value, kind: RecordKind) -> ExportShape<'_> {
    if let Some(list) = doc.get(kind.key()).and_then(Value::as_array) {
        return ExportShape::TopLevel(list);
    }

    match doc.get(DATA_KEY) {
        Some(Value::Object(inner)) => match inner.get(kind.key()).and_then(Value::as_array) {
            Some(list) => ExportShape::Nested(list),
            None => ExportShape::Unrecognized,
        },
        Some(Value::Array(list)) if kind == RecordKind::Metrics => ExportShape::BareList(list),
        _ => ExportShape::Unrecognized,
    }
}

/// Resolve and note when the document has no usable list.
fn extract_list(doc: &Value, kind: RecordKind) -> &[Value] {
    let shape = resolve_shape(doc, kind);
    if shape == ExportShape::Unrecognized {
        tracing::debug!(kind = kind.key(), "No list of this kind in export");
    }
    shape.entries()
}

// ─── Metrics ─────────────────────────────────────────────────

/// One named metric series.
#[derive(Debug, Deserialize)]
struct MetricSeries {
    name: String,
    units: Option<String>,
    #[serde(default)]
    data: Vec<Value>,
}

/// One observation inside a series.
#[derive(Debug, Deserialize)]
struct MetricPoint {
    date: String,
    qty: Option<f64>,
    source: Option<String>,
    #[serde(rename = "Min")]
    min: Option<f64>,
    #[serde(rename = "Avg")]
    avg: Option<f64>,
    #[serde(rename = "Max")]
    max: Option<f64>,
}

/// A metric point flattened together with its series name and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatMetric {
    pub metric: String,
    pub unit: Option<String>,
    pub date: NaiveDateTime,
    pub qty: Option<f64>,
    pub source: Option<String>,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// Flatten every point of every series. Unparseable series or points are skipped.
pub fn flatten_metrics(series_list: &[Value]) -> Vec<FlatMetric> {
    let mut flat = Vec::new();
    for raw_series in series_list {
        let series: MetricSeries = match serde_json::from_value(raw_series.clone()) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed metric series");
                continue;
            }
        };

        for raw_point in &series.data {
            let point: MetricPoint = match serde_json::from_value(raw_point.clone()) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(metric = %series.name, error = %e, "Skipping malformed point");
                    continue;
                }
            };
            let Some(date) = parse_utc_naive(&point.date) else {
                tracing::debug!(metric = %series.name, date = %point.date, "Skipping unparseable date");
                continue;
            };

            flat.push(FlatMetric {
                metric: series.name.clone(),
                unit: series.units.clone(),
                date,
                qty: point.qty,
                source: point.source,
                min: point.min,
                avg: point.avg,
                max: point.max,
            });
        }
    }
    flat
}

/// Flattened metrics found in any supported layout.
pub fn extract_metrics(doc: &Value) -> Vec<FlatMetric> {
    flatten_metrics(extract_list(doc, RecordKind::Metrics))
}

impl FlatMetric {
    /// Convert to a storable sample.
    ///
    /// Series that only report Min/Avg/Max (heart rate) use the average.
    pub fn into_biometric(self) -> Option<Biometric> {
        let value = self.qty.or(self.avg)?;
        Some(Biometric {
            date: self.date,
            metric_type: self.metric,
            value,
            unit: self.unit,
            source: self
                .source
                .unwrap_or_else(|| SOURCE_APPLE_HEALTH.to_string()),
        })
    }
}

// ─── Workouts ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WorkoutEntry {
    #[serde(default)]
    id: Option<Value>,
    name: String,
    start: String,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default)]
    distance: Option<Value>,
    #[serde(default)]
    avg_heart_rate: Option<Value>,
    #[serde(default)]
    max_heart_rate: Option<Value>,
    #[serde(default)]
    active_energy: Option<Value>,
    #[serde(default)]
    route: Option<Value>,
}

/// Numeric field that may arrive bare or wrapped as `{"qty": n, "units": ..}`.
fn quantity(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("qty").and_then(Value::as_f64),
        _ => None,
    }
}

/// Identity for a workout without a usable id of its own.
pub fn synthetic_run_id(start: NaiveDateTime) -> String {
    format!("run_{}", unix_seconds(truncate_to_seconds(start)))
}

/// Keep running workouts only and map them to canonical runs.
pub fn parse_workouts(workouts: &[Value]) -> Vec<Run> {
    let mut runs = Vec::new();
    for raw in workouts {
        let workout: WorkoutEntry = match serde_json::from_value(raw.clone()) {
            Ok(w) => w,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed workout");
                continue;
            }
        };
        if workout.name != RUNNING_WORKOUT {
            continue;
        }
        let Some(date) = parse_utc_naive(&workout.start) else {
            tracing::debug!(start = %workout.start, "Skipping workout with unparseable start");
            continue;
        };

        let external_id = match workout.id {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => synthetic_run_id(date),
        };

        runs.push(Run {
            external_id,
            date: truncate_to_seconds(date),
            distance_km: quantity(workout.distance.as_ref()),
            duration_min: quantity(workout.duration.as_ref()),
            avg_hr: quantity(workout.avg_heart_rate.as_ref()),
            max_hr: quantity(workout.max_heart_rate.as_ref()),
            energy_kcal: quantity(workout.active_energy.as_ref()),
            source: SOURCE_APPLE_HEALTH.to_string(),
            route: workout.route,
            indoor: false,
        });
    }
    runs
}

/// Everything usable in one export document.
#[derive(Debug, Default)]
pub struct NormalizedExport {
    pub biometrics: Vec<Biometric>,
    pub runs: Vec<Run>,
}

/// Normalize a whole export document.
pub fn normalize_export(doc: &Value) -> NormalizedExport {
    if resolve_shape(doc, RecordKind::Metrics) == ExportShape::Unrecognized
        && resolve_shape(doc, RecordKind::Workouts) == ExportShape::Unrecognized
    {
        tracing::warn!("Unrecognized export structure, nothing to ingest");
        return NormalizedExport::default();
    }

    let biometrics = extract_metrics(doc)
        .into_iter()
        .filter_map(FlatMetric::into_biometric)
        .collect();
    let runs = parse_workouts(extract_list(doc, RecordKind::Workouts));

    NormalizedExport { biometrics, runs }
}

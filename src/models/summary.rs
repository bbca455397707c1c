// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Compact training summary handed to downstream analysis.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Direction of the recent average relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    High,
    Low,
    Stable,
}

/// Recent vs. baseline figures for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub seven_day_avg: f64,
    pub baseline: f64,
    pub trend: Trend,
}

/// Physiology grouped the way the analysis prompt consumes it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Physiology {
    pub cardio: BTreeMap<String, MetricStats>,
    pub composition: BTreeMap<String, MetricStats>,
}

/// Slim run view for the summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub date: NaiveDateTime,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub avg_hr: Option<f64>,
    pub energy_kcal: Option<f64>,
    pub source: String,
}

/// The whole summary document.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub window_days: u32,
    pub physiology: Physiology,
    pub recent_runs: Vec<RunSummary>,
}

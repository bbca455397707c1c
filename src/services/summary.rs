// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Compact summary of recent physiology and training.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Biometric, MetricStats, Physiology, Summary, Trend};
use chrono::{Duration, NaiveDateTime, Utc};

pub const CARDIO_METRICS: &[&str] = &["resting_heart_rate", "heart_rate_variability", "vo2_max"];

/// Stored type name and the label used in the summary.
pub const COMPOSITION_METRICS: &[(&str, &str)] = &[
    ("weight_body_mass", "weight"),
    ("body_fat_percentage", "body_fat_percentage"),
    ("lean_body_mass", "lean_body_mass"),
];

const RECENT_DAYS: i64 = 7;
const HIGH_RATIO: f64 = 1.02;
const LOW_RATIO: f64 = 0.98;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Classify a recent average against its baseline (2% dead band).
pub fn trend(recent: f64, baseline: f64) -> Trend {
    if recent > baseline * HIGH_RATIO {
        Trend::High
    } else if recent < baseline * LOW_RATIO {
        Trend::Low
    } else {
        Trend::Stable
    }
}

/// Seven-day average vs. the whole window for one metric.
///
/// `None` when the window holds no samples of that type. A metric with no
/// samples in the last seven days reports a recent average of zero.
pub fn metric_stats(samples: &[Biometric], metric_type: &str, now: NaiveDateTime) -> Option<MetricStats> {
    let recent_cutoff = now - Duration::days(RECENT_DAYS);
    let of_type = || samples.iter().filter(|s| s.metric_type == metric_type);

    let baseline = mean(of_type().map(|s| s.value))?;
    let recent = mean(of_type().filter(|s| s.date > recent_cutoff).map(|s| s.value)).unwrap_or(0.0);

    Some(MetricStats {
        seven_day_avg: round2(recent),
        baseline: round2(baseline),
        trend: trend(recent, baseline),
    })
}

/// Build the summary over the last `days` days and the `run_limit` newest runs.
pub async fn build_summary(db: &Database, days: u32, run_limit: u32) -> Result<Summary, AppError> {
    let generated_at = Utc::now();
    let now = generated_at.naive_utc();
    let since = now - Duration::days(i64::from(days));

    let types: Vec<&str> = CARDIO_METRICS
        .iter()
        .copied()
        .chain(COMPOSITION_METRICS.iter().map(|(stored, _)| *stored))
        .collect();
    let samples = db.biometrics_since(&types, since).await?;

    let mut physiology = Physiology::default();
    for metric in CARDIO_METRICS {
        if let Some(stats) = metric_stats(&samples, metric, now) {
            physiology.cardio.insert(metric.to_string(), stats);
        }
    }
    for (stored, label) in COMPOSITION_METRICS {
        if let Some(stats) = metric_stats(&samples, stored, now) {
            physiology.composition.insert(label.to_string(), stats);
        }
    }

    let recent_runs = db.recent_runs(run_limit).await?;

    tracing::debug!(
        samples = samples.len(),
        runs = recent_runs.len(),
        "Summary built"
    );

    Ok(Summary {
        generated_at,
        window_days: days,
        physiology,
        recent_runs,
    })
}

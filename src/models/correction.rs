// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Manual corrections for indoor runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One work interval of a structured treadmill session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Interval {
    #[validate(range(exclusive_min = 0.0))]
    pub distance_km: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub speed_kmh: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub rest_sec: f64,
}

/// Corrected figures for one run, keyed by the run's `external_id`.
///
/// Immutable once stored; a second correction for the same run is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualCorrection {
    pub run_id: String,
    pub distance_km: f64,
    pub duration_min: f64,
    /// Perceived intensity, 1-10
    pub intensity: u8,
    /// Empty for a simple continuous-run correction
    #[serde(default)]
    pub intervals: Vec<Interval>,
    pub notes: Option<String>,
    pub corrected_on: DateTime<Utc>,
}

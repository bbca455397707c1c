// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Canonical workout record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Source tag for runs pulled from the activity API.
pub const SOURCE_STRAVA: &str = "strava";
/// Source tag for runs and samples pushed from the wearable export.
pub const SOURCE_APPLE_HEALTH: &str = "Apple Health";

/// A normalized run, ready for persistence.
///
/// `external_id` is the identity used for deduplication and upserts:
/// `strava_<activity id>` for API runs, `run_<epoch seconds>` for export
/// workouts that carry no id of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub external_id: String,
    /// Workout start, UTC with the offset dropped
    pub date: NaiveDateTime,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub energy_kcal: Option<f64>,
    /// Free-text source tag ("strava", "Apple Health", ...)
    pub source: String,
    /// Opaque route/map blob as delivered by the source
    pub route: Option<serde_json::Value>,
    /// Treadmill or virtual run whose GPS distance is unreliable
    #[serde(default)]
    pub indoor: bool,
}

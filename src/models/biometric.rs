// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Single timestamped body measurement.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One biometric sample. `(date, metric_type, source)` is its identity;
/// samples are append-only and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biometric {
    pub date: NaiveDateTime,
    #[serde(rename = "type")]
    pub metric_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub source: String,
}

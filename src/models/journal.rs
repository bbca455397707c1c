// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily training journal row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One journal day, keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: NaiveDate,
    /// Rate of perceived exertion
    pub rpe: Option<f64>,
    pub mood: Option<f64>,
    pub soreness: Option<f64>,
    pub knee_pain: Option<f64>,
    pub sleep_quality: Option<f64>,
    pub notes: Option<String>,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Canonical records shared by normalizers, reconciliation and storage.

pub mod biometric;
pub mod correction;
pub mod journal;
pub mod run;
pub mod summary;

pub use biometric::Biometric;
pub use correction::{Interval, ManualCorrection};
pub use journal::JournalEntry;
pub use run::Run;
pub use summary::{MetricStats, Physiology, RunSummary, Summary, Trend};

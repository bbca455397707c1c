// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deduplication and reconciliation against persisted state.
//!
//! Runs are classified against a snapshot loaded once per sync, so each
//! candidate costs one hash lookup. Biometrics need no classification here:
//! the store ignores conflicting `(date, type, source)` rows in bulk.

use crate::models::Run;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// What to do with a batch of candidate runs.
#[derive(Debug, Default)]
pub struct RunPlan {
    /// Identity not yet stored
    pub new: Vec<Run>,
    /// Stored, but the upstream values differ
    pub changed: Vec<Run>,
    /// Stored and identical; discarded
    pub unchanged: usize,
}

impl RunPlan {
    /// Runs that must be written (new first, then changed).
    pub fn writes(&self) -> Vec<Run> {
        self.new.iter().chain(self.changed.iter()).cloned().collect()
    }

    pub fn is_noop(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty()
    }
}

/// Keep only the last occurrence of each key, preserving relative order.
pub fn dedupe_last_wins<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(key(item)))
        .collect();
    kept.reverse();
    kept
}

/// Classify candidates against the stored snapshot for their source.
pub fn classify_runs(candidates: Vec<Run>, snapshot: &HashMap<String, Run>) -> RunPlan {
    let candidates = dedupe_last_wins(candidates, |run| run.external_id.clone());

    let mut plan = RunPlan::default();
    for run in candidates {
        match snapshot.get(&run.external_id) {
            None => plan.new.push(run),
            Some(stored) if *stored != run => plan.changed.push(run),
            Some(_) => plan.unchanged += 1,
        }
    }
    plan
}

/// Merge a freshly fetched raw batch into a previously kept one, keyed by
/// the numeric `id`; the most recently fetched version of an id wins.
/// Entries without a numeric id are kept as they are.
pub fn merge_activity_batches(previous: Vec<Value>, fetched: Vec<Value>) -> Vec<Value> {
    let combined: Vec<(usize, Value)> = previous.into_iter().chain(fetched).enumerate().collect();

    dedupe_last_wins(combined, |(position, value)| {
        match value.get("id").and_then(Value::as_u64) {
            Some(id) => ActivityKey::Id(id),
            None => ActivityKey::Unkeyed(*position),
        }
    })
    .into_iter()
    .map(|(_, value)| value)
    .collect()
}

#[derive(PartialEq, Eq, Hash)]
enum ActivityKey {
    Id(u64),
    Unkeyed(usize),
}

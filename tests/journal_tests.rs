// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal sync through the HTTP route.

mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{create_test_app, create_test_app_with, seeded_credentials, send, ScriptedActivityApi, TEST_API_KEY};
use runlytics::config::Config;
use runlytics::services::journal::JournalRow;
use serde_json::{json, Value};
use std::sync::Arc;

fn rows(values: Vec<Value>) -> Vec<JournalRow> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

async fn app_with_journal(journal: Vec<JournalRow>) -> (axum::Router, Arc<runlytics::AppState>) {
    create_test_app_with(
        Config::test_default(),
        Arc::new(ScriptedActivityApi::default()),
        seeded_credentials(),
        Some(journal),
    )
    .await
}

#[tokio::test]
async fn test_journal_sync_upserts_by_date() {
    let journal = rows(vec![
        json!({"Timestamp": "3/14/2025 7:02:11", "Date": "2025-03-14", "RPE (Exertion)": 7,
               "Mood / Motivation ": 4, "Knee pain": "", "Sleep Quality": "3", "Notes": "tempo"}),
        json!({"Timestamp": "3/15/2025 7:10:00", "Date": "2025-03-15", "RPE (Exertion)": 3,
               "Mood / Motivation ": 5, "Knee pain": 1, "Sleep Quality": 4, "Notes": ""}),
        json!({"Timestamp": "3/16/2025 7:10:00", "Date": "", "RPE (Exertion)": 2,
               "Mood / Motivation ": 5, "Knee pain": 0, "Sleep Quality": 4, "Notes": ""}),
    ]);
    let (app, state) = app_with_journal(journal).await;

    let (status, body) = send(&app, "POST", "/sync/journal", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Journal sync complete: 2 entries saved, 1 rows skipped"
    );

    let entry = state
        .db
        .get_journal_entry(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.rpe, Some(7.0));
    assert_eq!(entry.mood, Some(4.0));
    assert_eq!(entry.knee_pain, None);
    assert_eq!(entry.sleep_quality, Some(3.0));
    assert_eq!(entry.soreness, None);
    assert_eq!(entry.notes.as_deref(), Some("tempo"));

    // Second run updates rows in place.
    let (status, _) = send(&app, "POST", "/sync/journal", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.db.count_journal_entries().await.unwrap(), 2);
}

#[tokio::test]
async fn test_journal_without_date_column() {
    let journal = rows(vec![json!({"RPE": 7, "Mood": 4})]);
    let (app, state) = app_with_journal(journal).await;

    let (status, body) = send(&app, "POST", "/sync/journal", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Journal sync aborted: no Date column found");
    assert_eq!(state.db.count_journal_entries().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_journal() {
    let (app, _) = app_with_journal(Vec::new()).await;

    let (_, body) = send(&app, "POST", "/sync/journal", Some(TEST_API_KEY), None).await;
    assert_eq!(body["message"], "Journal is empty");
}

#[tokio::test]
async fn test_journal_not_configured() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(&app, "POST", "/sync/journal", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

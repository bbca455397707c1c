// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava sync, corrections and archive, driven through the HTTP routes.

mod common;

use axum::http::StatusCode;
use common::{
    create_test_app_with, run_activity, seeded_credentials, send, PageResponse,
    ScriptedActivityApi, TEST_API_KEY,
};
use runlytics::config::Config;
use runlytics::services::credentials::{CredentialStore, STRAVA_ACCESS_TOKEN, STRAVA_REFRESH_TOKEN};
use runlytics::services::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;

const START: &str = "2024-12-14T15:00:00Z";
const START_UNIX: i64 = 1_734_188_400;

#[tokio::test]
async fn test_resync_updates_run_in_place() {
    let api = Arc::new(ScriptedActivityApi::new(vec![PageResponse::Page(vec![
        run_activity(1, 3000.0, START),
    ])]));
    let (app, state) =
        create_test_app_with(Config::test_default(), api.clone(), seeded_credentials(), None).await;

    let (status, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Fetched 1 activities: 1 new runs, 0 updated, 0 unchanged"
    );

    api.push(vec![PageResponse::Page(vec![run_activity(1, 5000.0, START)])]);
    let (status, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Fetched 1 activities: 0 new runs, 1 updated, 0 unchanged"
    );

    assert_eq!(state.db.count_runs().await.unwrap(), 1);
    let run = state.db.get_run("strava_1").await.unwrap().unwrap();
    assert_eq!(run.distance_km, Some(5.0));
    assert_eq!(run.source, "strava");

    // First sync has no cursor; the second starts at the stored run.
    let calls = api.calls();
    assert_eq!(calls[0].after, None);
    assert_eq!(calls[1].after, Some(START_UNIX));
}

#[tokio::test]
async fn test_unchanged_resync_writes_nothing() {
    let api = Arc::new(ScriptedActivityApi::new(vec![
        PageResponse::Page(vec![run_activity(1, 3000.0, START)]),
        PageResponse::Page(vec![run_activity(1, 3000.0, START)]),
    ]));
    let (app, _) =
        create_test_app_with(Config::test_default(), api, seeded_credentials(), None).await;

    send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    let (_, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(
        body["message"],
        "Fetched 1 activities: 0 new runs, 0 updated, 1 unchanged"
    );
}

#[tokio::test]
async fn test_failed_fetch_writes_nothing() {
    let mut config = Config::test_default();
    config.strava_page_size = 2;
    let api = Arc::new(ScriptedActivityApi::new(vec![
        PageResponse::Page(vec![
            run_activity(1, 3000.0, START),
            run_activity(2, 4000.0, "2024-12-15T15:00:00Z"),
        ]),
        PageResponse::Failure(503),
    ]));
    let (app, state) = create_test_app_with(config, api, seeded_credentials(), None).await;

    let (status, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "strava_error");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("HTTP 503"), "{}", details);
    assert!(details.contains("2 activities fetched before failure"), "{}", details);

    assert_eq!(state.db.count_runs().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_access_token_is_refreshed_first() {
    let api = Arc::new(ScriptedActivityApi::new(vec![PageResponse::Page(vec![
        run_activity(1, 3000.0, START),
    ])]));
    let credentials = Arc::new(MemoryStore::with_entries(&[(
        STRAVA_REFRESH_TOKEN,
        "initial-refresh",
    )]));
    let (app, _) = create_test_app_with(
        Config::test_default(),
        api.clone(),
        credentials.clone(),
        None,
    )
    .await;

    let (status, _) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(api.refreshes(), 1);
    assert_eq!(api.calls()[0].token, "fresh-access-1");
    assert_eq!(
        credentials.get(STRAVA_ACCESS_TOKEN).await.unwrap().as_deref(),
        Some("fresh-access-1")
    );
}

#[tokio::test]
async fn test_non_runs_are_ignored() {
    let api = Arc::new(ScriptedActivityApi::new(vec![PageResponse::Page(vec![
        json!({"id": 9, "type": "Ride", "distance": 40000.0, "moving_time": 3600,
               "start_date": START}),
        run_activity(1, 3000.0, START),
    ])]));
    let (app, state) =
        create_test_app_with(Config::test_default(), api, seeded_credentials(), None).await;

    let (_, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(
        body["message"],
        "Fetched 2 activities: 1 new runs, 0 updated, 0 unchanged"
    );
    assert_eq!(state.db.count_runs().await.unwrap(), 1);
}

fn treadmill_run(id: u64, distance_m: f64) -> Value {
    let mut activity = run_activity(id, distance_m, START);
    activity["trainer"] = json!(true);
    activity
}

#[tokio::test]
async fn test_indoor_run_correction_flow() {
    let api = Arc::new(ScriptedActivityApi::new(vec![PageResponse::Page(vec![
        treadmill_run(7, 3100.0),
    ])]));
    let (app, state) =
        create_test_app_with(Config::test_default(), api.clone(), seeded_credentials(), None)
            .await;

    let (_, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(
        body["message"],
        "Fetched 1 activities: 1 new runs, 0 updated, 0 unchanged; 1 indoor runs awaiting correction"
    );

    let (status, pending) =
        send(&app, "GET", "/corrections/pending", Some(TEST_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["count"], 1);
    assert_eq!(pending["runs"][0]["run_id"], "strava_7");

    let (status, body) = send(
        &app,
        "POST",
        "/corrections/strava_7",
        Some(TEST_API_KEY),
        Some(json!({"intervals": [
            {"distance_km": 1.0, "speed_kmh": 12.0, "rest_sec": 90},
            {"distance_km": 1.0, "speed_kmh": 12.0}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    assert_eq!(body["correction"]["distance_km"], 2.0);
    assert_eq!(body["correction"]["duration_min"], 11.5);
    assert_eq!(body["correction"]["intensity"], 8);

    let run = state.db.get_run("strava_7").await.unwrap().unwrap();
    assert_eq!(run.distance_km, Some(2.0));
    assert_eq!(run.duration_min, Some(11.5));

    let (_, pending) = send(&app, "GET", "/corrections/pending", Some(TEST_API_KEY), None).await;
    assert_eq!(pending["count"], 0);

    // Corrections are write-once.
    let (status, body) = send(
        &app,
        "POST",
        "/corrections/strava_7",
        Some(TEST_API_KEY),
        Some(json!({"distance_km": 9.0, "duration_min": 50.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "exists");
    assert_eq!(body["correction"]["distance_km"], 2.0);

    // A re-sync keeps the corrected figures.
    api.push(vec![PageResponse::Page(vec![treadmill_run(7, 3300.0)])]);
    let (_, body) = send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;
    assert_eq!(
        body["message"],
        "Fetched 1 activities: 0 new runs, 0 updated, 1 unchanged; 1 with manual corrections"
    );
    let run = state.db.get_run("strava_7").await.unwrap().unwrap();
    assert_eq!(run.distance_km, Some(2.0));
}

#[tokio::test]
async fn test_correction_validation() {
    let api = Arc::new(ScriptedActivityApi::new(vec![PageResponse::Page(vec![
        treadmill_run(7, 3100.0),
    ])]));
    let (app, _) =
        create_test_app_with(Config::test_default(), api, seeded_credentials(), None).await;
    send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/corrections/strava_999",
        Some(TEST_API_KEY),
        Some(json!({"distance_km": 5.0, "duration_min": 30.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/corrections/strava_7",
        Some(TEST_API_KEY),
        Some(json!({"distance_km": 5.0, "duration_min": 30.0, "intensity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/corrections/strava_7",
        Some(TEST_API_KEY),
        Some(json!({"notes": "forgot the numbers"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archive_accumulates_raw_activities() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("activities.json");
    let mut config = Config::test_default();
    config.activity_archive_path = Some(archive.clone());

    let api = Arc::new(ScriptedActivityApi::new(vec![PageResponse::Page(vec![
        run_activity(1, 3000.0, START),
        run_activity(2, 4000.0, "2024-12-15T15:00:00Z"),
    ])]));
    let (app, _) = create_test_app_with(config, api.clone(), seeded_credentials(), None).await;
    send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;

    api.push(vec![PageResponse::Page(vec![
        run_activity(2, 4200.0, "2024-12-15T15:00:00Z"),
        run_activity(3, 5000.0, "2024-12-16T15:00:00Z"),
    ])]);
    send(&app, "POST", "/sync/strava", Some(TEST_API_KEY), None).await;

    let stored: Vec<Value> = serde_json::from_slice(&std::fs::read(&archive).unwrap()).unwrap();
    let ids: Vec<u64> = stored.iter().map(|a| a["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(stored[1]["distance"], 4200.0);
}

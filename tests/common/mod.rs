// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use runlytics::config::Config;
use runlytics::db::Database;
use runlytics::error::AppError;
use runlytics::routes::create_router;
use runlytics::services::credentials::{STRAVA_ACCESS_TOKEN, STRAVA_REFRESH_TOKEN};
use runlytics::services::journal::JournalRow;
use runlytics::services::strava::TokenRefreshResponse;
use runlytics::services::{ActivityApi, JournalSource, MemoryStore, StaticJournalSource};
use runlytics::AppState;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[allow(dead_code)]
pub const TEST_API_KEY: &str = "test_api_key";

/// One scripted answer to a page request.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum PageResponse {
    Page(Vec<Value>),
    Unauthorized,
    Failure(u16),
}

/// A page request as the fake API saw it.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct PageCall {
    pub token: String,
    pub after: Option<i64>,
    pub page: u32,
    pub per_page: u32,
}

/// Activity API that replays scripted responses; empty pages once exhausted.
#[derive(Default)]
pub struct ScriptedActivityApi {
    responses: Mutex<VecDeque<PageResponse>>,
    calls: Mutex<Vec<PageCall>>,
    refreshes: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedActivityApi {
    pub fn new(responses: Vec<PageResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Queue more responses (e.g. for a second sync).
    pub fn push(&self, responses: Vec<PageResponse>) {
        self.responses.lock().unwrap().extend(responses);
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivityApi for ScriptedActivityApi {
    async fn list_activities(
        &self,
        access_token: &str,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, AppError> {
        self.calls.lock().unwrap().push(PageCall {
            token: access_token.to_string(),
            after,
            page,
            per_page,
        });

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            None => Ok(Vec::new()),
            Some(PageResponse::Page(items)) => Ok(items),
            Some(PageResponse::Unauthorized) => Err(AppError::StravaUnauthorized),
            Some(PageResponse::Failure(status)) => {
                Err(AppError::StravaApi(format!("HTTP {}: scripted failure", status)))
            }
        }
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<TokenRefreshResponse, AppError> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenRefreshResponse {
            access_token: format!("fresh-access-{}", n),
            refresh_token: Some(format!("fresh-refresh-{}", n)),
            expires_at: Some(1_900_000_000),
        })
    }
}

/// Credential store seeded with a valid-looking token pair.
#[allow(dead_code)]
pub fn seeded_credentials() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_entries(&[
        (STRAVA_ACCESS_TOKEN, "initial-access"),
        (STRAVA_REFRESH_TOKEN, "initial-refresh"),
    ]))
}

/// Create an in-memory test database.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}

/// Create a test app around the given fakes.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app_with(
    config: Config,
    api: Arc<ScriptedActivityApi>,
    credentials: Arc<MemoryStore>,
    journal_rows: Option<Vec<JournalRow>>,
) -> (axum::Router, Arc<AppState>) {
    let db = test_db().await;
    let journal_source = journal_rows
        .map(|rows| Arc::new(StaticJournalSource::new(rows)) as Arc<dyn JournalSource>);

    let state = Arc::new(AppState::new(
        config,
        db,
        api,
        credentials,
        journal_source,
    ));

    (create_router(state.clone()), state)
}

/// Create a test app with no scripted activities and no journal.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(
        Config::test_default(),
        Arc::new(ScriptedActivityApi::default()),
        seeded_credentials(),
        None,
    )
    .await
}

/// Raw activity as the list endpoint returns it.
#[allow(dead_code)]
pub fn run_activity(id: u64, distance_m: f64, start: &str) -> Value {
    json!({
        "id": id,
        "type": "Run",
        "sport_type": "Run",
        "distance": distance_m,
        "moving_time": 1800,
        "elapsed_time": 1900,
        "average_heartrate": 150.0,
        "start_date": start,
        "start_date_local": start,
        "trainer": false,
        "map": {"summary_polyline": "abc"}
    })
}

/// Send a request and decode the JSON response body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-API-KEY", key);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

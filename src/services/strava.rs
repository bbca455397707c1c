// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client and activity normalization.
//!
//! Handles:
//! - Paginated athlete activity listing
//! - Token refresh when the access token is rejected
//! - Mapping raw activities to canonical runs (meters/seconds to km/minutes)

use crate::error::AppError;
use crate::models::run::SOURCE_STRAVA;
use crate::models::Run;
use crate::time_utils::{parse_utc_naive, truncate_to_seconds};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Activity type kept by the normalizer.
pub const RUN_ACTIVITY_TYPE: &str = "Run";
/// Sport type Strava uses for treadmill apps such as Zwift.
const VIRTUAL_RUN_SPORT_TYPE: &str = "VirtualRun";

/// Remote activity provider as seen by the fetch coordinator.
///
/// Implemented by [`StravaClient`]; tests script their own.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// One page of raw activity objects. A rejected token must surface as
    /// [`AppError::StravaUnauthorized`].
    async fn list_activities(
        &self,
        access_token: &str,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, AppError>;

    /// Exchange a refresh token for a new access/refresh pair.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRefreshResponse, AppError>;
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(
        base_url: String,
        token_url: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token_url,
            client_id,
            client_secret,
        }
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::StravaUnauthorized);
            }

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl ActivityApi for StravaClient {
    async fn list_activities(
        &self,
        access_token: &str,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let mut query = vec![
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        // A 401 here means the refresh token itself is dead; report it as a
        // plain API failure so the coordinator does not try to refresh again.
        match self.check_response_json(response).await {
            Err(AppError::StravaUnauthorized) => Err(AppError::StravaApi(
                "Token refresh rejected: refresh token invalid".to_string(),
            )),
            other => other,
        }
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Summary activity as returned by the list endpoint (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivity {
    pub id: u64,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub sport_type: Option<String>,
    /// Meters
    pub distance: Option<f64>,
    /// Seconds
    pub moving_time: Option<f64>,
    /// Seconds
    pub elapsed_time: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub kilojoules: Option<f64>,
    pub start_date: Option<String>,
    pub start_date_local: Option<String>,
    #[serde(default)]
    pub trainer: bool,
    pub map: Option<Value>,
}

impl StravaActivity {
    pub fn is_run(&self) -> bool {
        self.activity_type
            .as_deref()
            .or(self.sport_type.as_deref())
            == Some(RUN_ACTIVITY_TYPE)
    }

    /// Treadmill or virtual run: GPS distance can't be trusted.
    pub fn is_indoor(&self) -> bool {
        self.trainer || self.sport_type.as_deref() == Some(VIRTUAL_RUN_SPORT_TYPE)
    }
}

/// Identity of a Strava activity in the runs table.
pub fn strava_run_id(activity_id: u64) -> String {
    format!("strava_{}", activity_id)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Map one activity to a run. `None` for non-runs and malformed entries.
pub fn normalize_activity(activity: &StravaActivity) -> Option<Run> {
    if !activity.is_run() {
        return None;
    }

    // `start_date` is true UTC; `start_date_local` is wall time labelled Z.
    let raw_start = activity
        .start_date
        .as_deref()
        .or(activity.start_date_local.as_deref())?;
    let date = parse_utc_naive(raw_start)?;

    let distance_m = activity.distance?;
    let seconds = activity.moving_time.or(activity.elapsed_time)?;

    Some(Run {
        external_id: strava_run_id(activity.id),
        date: truncate_to_seconds(date),
        distance_km: Some(round2(distance_m / 1000.0)),
        duration_min: Some(round2(seconds / 60.0)),
        avg_hr: activity.average_heartrate,
        max_hr: activity.max_heartrate,
        energy_kcal: activity.kilojoules,
        source: SOURCE_STRAVA.to_string(),
        route: activity.map.clone(),
        indoor: activity.is_indoor(),
    })
}

/// Normalize a raw page batch, skipping anything that doesn't map to a run.
pub fn normalize_activities(raw: &[Value]) -> Vec<Run> {
    raw.iter()
        .filter_map(|value| match serde_json::from_value::<StravaActivity>(value.clone()) {
            Ok(activity) => {
                let run = normalize_activity(&activity);
                if run.is_none() && activity.is_run() {
                    tracing::debug!(activity_id = activity.id, "Skipping run with missing fields");
                }
                run
            }
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed activity");
                None
            }
        })
        .collect()
}

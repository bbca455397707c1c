// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental fetch coordinator for the paginated activity API.
//!
//! Pages are requested strictly one after another: the provider gives no
//! "last page" marker, so the size of each page decides whether another
//! request is needed. A page shorter than `per_page` (or empty) ends the
//! walk.
//!
//! A 401 triggers exactly one token refresh, persisted to the credential
//! store, followed by a retry of the same page. Any other failure stops
//! pagination; pages already fetched are handed back with the error.

use crate::config::MAX_STRAVA_PAGE_SIZE;
use crate::error::AppError;
use crate::services::credentials::{
    CredentialStore, STRAVA_ACCESS_TOKEN, STRAVA_REFRESH_TOKEN, STRAVA_TOKEN_EXPIRES_AT,
};
use crate::services::strava::ActivityApi;
use serde_json::Value;

/// Result of one pagination walk.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Raw activities from every page that succeeded, in fetch order
    pub activities: Vec<Value>,
    /// Page requests issued, retries included
    pub requests: u32,
    /// Token refreshes performed
    pub refreshes: u32,
    /// Set when pagination stopped on a failure
    pub error: Option<AppError>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Refresh the access token and write the new pair back to the store.
pub async fn refresh_and_store(
    api: &dyn ActivityApi,
    credentials: &dyn CredentialStore,
) -> Result<String, AppError> {
    let refresh_token = credentials
        .get(STRAVA_REFRESH_TOKEN)
        .await?
        .ok_or_else(|| {
            AppError::Credentials(format!("{} is not configured", STRAVA_REFRESH_TOKEN))
        })?;

    let tokens = api.refresh_token(&refresh_token).await?;

    let mut entries = vec![(STRAVA_ACCESS_TOKEN, tokens.access_token.clone())];
    if let Some(refresh) = tokens.refresh_token {
        entries.push((STRAVA_REFRESH_TOKEN, refresh));
    }
    if let Some(expires_at) = tokens.expires_at {
        entries.push((STRAVA_TOKEN_EXPIRES_AT, expires_at.to_string()));
    }
    credentials.set(&entries).await?;

    tracing::info!("Strava access token refreshed and stored");
    Ok(tokens.access_token)
}

/// Drives paginated retrieval for one sync.
pub struct FetchCoordinator<'a> {
    api: &'a dyn ActivityApi,
    credentials: &'a dyn CredentialStore,
    per_page: u32,
}

impl<'a> FetchCoordinator<'a> {
    pub fn new(
        api: &'a dyn ActivityApi,
        credentials: &'a dyn CredentialStore,
        per_page: u32,
    ) -> Self {
        Self {
            api,
            credentials,
            per_page: per_page.clamp(1, MAX_STRAVA_PAGE_SIZE),
        }
    }

    /// Fetch every activity after the optional `after` cursor (unix seconds).
    pub async fn fetch_all(&self, access_token: String, after: Option<i64>) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let mut token = access_token;
        let mut page: u32 = 1;
        let mut refreshed_for_page = false;

        loop {
            outcome.requests += 1;
            match self
                .api
                .list_activities(&token, after, page, self.per_page)
                .await
            {
                Ok(batch) => {
                    refreshed_for_page = false;
                    let count = batch.len();
                    if count == 0 {
                        tracing::debug!(page, "Empty page, pagination done");
                        break;
                    }

                    outcome.activities.extend(batch);
                    tracing::info!(page, count, "Fetched activity page");

                    if count < self.per_page as usize {
                        tracing::debug!(page, "Partial page, pagination done");
                        break;
                    }
                    page += 1;
                }
                Err(e) if e.is_strava_token_error() && !refreshed_for_page => {
                    tracing::warn!(page, "Access token rejected, refreshing");
                    match refresh_and_store(self.api, self.credentials).await {
                        Ok(new_token) => {
                            token = new_token;
                            outcome.refreshes += 1;
                            refreshed_for_page = true;
                        }
                        Err(refresh_err) => {
                            outcome.error = Some(refresh_err);
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        page,
                        fetched = outcome.activities.len(),
                        error = %e,
                        "Activity fetch aborted"
                    );
                    outcome.error = Some(e);
                    break;
                }
            }
        }

        tracing::info!(
            total = outcome.activities.len(),
            requests = outcome.requests,
            "Activity fetch finished"
        );
        outcome
    }
}

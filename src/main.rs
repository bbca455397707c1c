// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Runlytics API Server
//!
//! Receives wearable health exports and triggers Strava and journal syncs,
//! storing everything in one SQL database.

use runlytics::{
    config::Config,
    db::Database,
    services::{EnvFileStore, JournalSource, SheetsClient, StravaClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Runlytics API");

    let db = Database::new(&config.database_url).await?;

    let activity_api = Arc::new(StravaClient::new(
        config.strava_api_base.clone(),
        config.strava_token_url.clone(),
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    ));

    let credentials = Arc::new(EnvFileStore::new(&config.credentials_path));
    tracing::info!(
        path = %config.credentials_path.display(),
        "Credential store initialized"
    );

    let journal_source: Option<Arc<dyn JournalSource>> =
        match (&config.journal_spreadsheet_id, &config.google_api_key) {
            (Some(spreadsheet_id), Some(api_key)) => {
                tracing::info!(range = %config.journal_range, "Journal source configured");
                Some(Arc::new(SheetsClient::new(
                    spreadsheet_id.clone(),
                    config.journal_range.clone(),
                    api_key.clone(),
                )))
            }
            _ => {
                tracing::warn!("JOURNAL_SPREADSHEET_ID or GOOGLE_API_KEY unset, journal sync disabled");
                None
            }
        };

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        activity_api,
        credentials,
        journal_source,
    ));

    // Build router
    let app = runlytics::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["runlytics=debug", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}

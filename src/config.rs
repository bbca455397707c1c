// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Strava access/refresh tokens are deliberately NOT part of this struct:
//! they rotate at runtime and live in the credential store instead
//! (see `services::credentials`).

use std::env;
use std::path::PathBuf;

/// Largest `per_page` Strava honours; bigger requests are silently capped.
pub const MAX_STRAVA_PAGE_SIZE: u32 = 200;
/// Default page size for activity listing.
pub const DEFAULT_STRAVA_PAGE_SIZE: u32 = MAX_STRAVA_PAGE_SIZE;
/// Default request body cap for `/ingest` (multi-day exports run to tens of MB).
pub const DEFAULT_INGEST_MAX_BYTES: usize = 64 * 1024 * 1024;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQL connection string (e.g. `sqlite://runlytics.db`)
    pub database_url: String,
    /// Shared secret expected in the `X-API-KEY` header
    pub api_key: String,
    /// Server port
    pub port: u16,
    /// Largest accepted `/ingest` body, in bytes
    pub ingest_max_bytes: usize,

    // --- Activity API ---
    /// Strava OAuth client ID
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Base URL for the athlete activity endpoints
    pub strava_api_base: String,
    /// OAuth token endpoint used for refresh
    pub strava_token_url: String,
    /// Requested page size for activity listing
    pub strava_page_size: u32,

    // --- Credential and archive files ---
    /// Key-value file holding the rotating Strava tokens
    pub credentials_path: PathBuf,
    /// Optional JSON file accumulating raw fetched activities
    pub activity_archive_path: Option<PathBuf>,

    // --- Journal spreadsheet ---
    /// Spreadsheet ID of the training journal
    pub journal_spreadsheet_id: Option<String>,
    /// A1 range (usually the worksheet name) to read
    pub journal_range: String,
    /// API key for the Sheets values endpoint
    pub google_api_key: Option<String>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            api_key: "test_api_key".to_string(),
            port: 8080,
            ingest_max_bytes: DEFAULT_INGEST_MAX_BYTES,
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            strava_api_base: "http://127.0.0.1:9/api/v3".to_string(),
            strava_token_url: "http://127.0.0.1:9/oauth/token".to_string(),
            strava_page_size: DEFAULT_STRAVA_PAGE_SIZE,
            credentials_path: PathBuf::from(".env.test"),
            activity_archive_path: None,
            journal_spreadsheet_id: None,
            journal_range: "Sheet1".to_string(),
            google_api_key: None,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let strava_page_size = match env::var("STRAVA_PAGE_SIZE") {
            Ok(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_STRAVA_PAGE_SIZE).contains(n))
                .ok_or(ConfigError::Invalid("STRAVA_PAGE_SIZE"))?,
            Err(_) => DEFAULT_STRAVA_PAGE_SIZE,
        };

        let ingest_max_bytes = match env::var("INGEST_MAX_BYTES") {
            Ok(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("INGEST_MAX_BYTES"))?,
            Err(_) => DEFAULT_INGEST_MAX_BYTES,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            api_key: env::var("API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("API_KEY"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            ingest_max_bytes,

            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            strava_api_base: env::var("STRAVA_API_BASE")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
            strava_token_url: env::var("STRAVA_TOKEN_URL")
                .unwrap_or_else(|_| "https://www.strava.com/oauth/token".to_string()),
            strava_page_size,

            credentials_path: env::var("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".env")),
            activity_archive_path: env::var("ACTIVITY_ARCHIVE_PATH").ok().map(PathBuf::from),

            journal_spreadsheet_id: env::var("JOURNAL_SPREADSHEET_ID").ok(),
            journal_range: env::var("JOURNAL_RANGE").unwrap_or_else(|_| "Sheet1".to_string()),
            google_api_key: env::var("GOOGLE_API_KEY").ok(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

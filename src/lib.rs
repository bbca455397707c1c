// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Runlytics: personal training data ingestion
//!
//! This crate receives wearable health exports, pulls runs from Strava and
//! reads a training journal sheet, normalizing all of it into one SQL
//! database and serving a compact summary for analysis.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use dashmap::DashMap;
use db::Database;
use services::{ActivityApi, CredentialStore, JournalSource};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub activity_api: Arc<dyn ActivityApi>,
    pub credentials: Arc<dyn CredentialStore>,
    /// `None` when no journal spreadsheet is configured
    pub journal_source: Option<Arc<dyn JournalSource>>,
    /// One lock per sync source; syncs of the same source never overlap.
    sync_locks: DashMap<&'static str, Arc<Mutex<()>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        activity_api: Arc<dyn ActivityApi>,
        credentials: Arc<dyn CredentialStore>,
        journal_source: Option<Arc<dyn JournalSource>>,
    ) -> Self {
        Self {
            config,
            db,
            activity_api,
            credentials,
            journal_source,
            sync_locks: DashMap::new(),
        }
    }

    /// Lock serializing syncs of `source`.
    pub fn sync_lock(&self, source: &'static str) -> Arc<Mutex<()>> {
        self.sync_locks
            .entry(source)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod corrections;
pub mod credentials;
pub mod fetch;
pub mod health_export;
pub mod journal;
pub mod reconcile;
pub mod strava;
pub mod summary;
pub mod sync;

pub use credentials::{CredentialStore, EnvFileStore, MemoryStore};
pub use fetch::{FetchCoordinator, FetchOutcome};
pub use journal::{JournalSource, SheetsClient, StaticJournalSource};
pub use strava::{ActivityApi, StravaClient};
pub use sync::{IngestReport, JournalReport, SyncReport};

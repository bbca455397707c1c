// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQL via sqlx).
//!
//! `Database` is constructed once at startup and passed down; each ingest
//! request or sync call opens its own transaction with [`Database::begin`].
//! Write helpers take a `&mut SqliteConnection` so they run inside that
//! transaction, while plain reads go straight to the pool.

pub mod biometrics;
pub mod corrections;
pub mod journal;
pub mod runs;

use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id TEXT NOT NULL UNIQUE,
        date TIMESTAMP NOT NULL,
        distance_km REAL,
        duration_min REAL,
        avg_hr REAL,
        max_hr REAL,
        energy_kcal REAL,
        source TEXT NOT NULL,
        route_json TEXT,
        indoor INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_runs_source_date ON runs(source, date)",
    r"
    CREATE TABLE IF NOT EXISTS biometrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TIMESTAMP NOT NULL,
        type TEXT NOT NULL,
        value REAL NOT NULL,
        unit TEXT,
        source TEXT NOT NULL,
        UNIQUE (date, type, source)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_biometrics_type_date ON biometrics(type, date)",
    r"
    CREATE TABLE IF NOT EXISTS daily_journal (
        date DATE PRIMARY KEY,
        rpe REAL,
        mood REAL,
        soreness REAL,
        knee_pain REAL,
        sleep_quality REAL,
        notes TEXT
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS manual_corrections (
        run_id TEXT PRIMARY KEY,
        distance_km REAL NOT NULL,
        duration_min REAL NOT NULL,
        intensity INTEGER NOT NULL,
        intervals_json TEXT NOT NULL,
        notes TEXT,
        corrected_on TEXT NOT NULL
    )
    ",
];

/// SQL storage handle.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and make sure the schema exists.
    ///
    /// `sqlite::memory:` URLs get a single pinned connection, since every
    /// new in-memory connection would otherwise see an empty database.
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;

        tracing::info!("Database connected and tables checked");
        Ok(db)
    }

    /// Create tables and indexes if they don't exist.
    async fn migrate(&self) -> Result<(), AppError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Start a unit of work. Dropping the transaction without `commit` rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin().await?)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_keeps_schema() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        // Schema is visible on later acquisitions of the pinned connection.
        for table in ["runs", "biometrics", "daily_journal", "manual_corrections"] {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
    }
}

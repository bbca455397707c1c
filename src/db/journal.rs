// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal storage: upsert by date.

use super::Database;
use crate::error::AppError;
use crate::models::JournalEntry;
use chrono::NaiveDate;
use sqlx::{Row, SqliteConnection};

/// Insert each entry, replacing every non-key column when the date exists.
pub async fn upsert_entries(
    conn: &mut SqliteConnection,
    entries: &[JournalEntry],
) -> Result<u64, AppError> {
    let mut written = 0;
    for entry in entries {
        let result = sqlx::query(
            r"
            INSERT INTO daily_journal (date, rpe, mood, soreness, knee_pain, sleep_quality, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(date) DO UPDATE SET
                rpe = excluded.rpe,
                mood = excluded.mood,
                soreness = excluded.soreness,
                knee_pain = excluded.knee_pain,
                sleep_quality = excluded.sleep_quality,
                notes = excluded.notes
            ",
        )
        .bind(entry.date)
        .bind(entry.rpe)
        .bind(entry.mood)
        .bind(entry.soreness)
        .bind(entry.knee_pain)
        .bind(entry.sleep_quality)
        .bind(&entry.notes)
        .execute(&mut *conn)
        .await?;

        written += result.rows_affected();
    }
    Ok(written)
}

impl Database {
    /// Get the journal entry for one day.
    pub async fn get_journal_entry(&self, date: NaiveDate) -> Result<Option<JournalEntry>, AppError> {
        let row = sqlx::query(
            r"
            SELECT date, rpe, mood, soreness, knee_pain, sleep_quality, notes
            FROM daily_journal
            WHERE date = ?1
            ",
        )
        .bind(date)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(JournalEntry {
            date: row.try_get("date")?,
            rpe: row.try_get("rpe")?,
            mood: row.try_get("mood")?,
            soreness: row.try_get("soreness")?,
            knee_pain: row.try_get("knee_pain")?,
            sleep_quality: row.try_get("sleep_quality")?,
            notes: row.try_get("notes")?,
        }))
    }

    /// Total stored journal days.
    pub async fn count_journal_entries(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM daily_journal")
            .fetch_one(self.pool())
            .await?)
    }
}

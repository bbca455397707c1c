// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Biometric storage: bulk conflict-ignore inserts and window reads.

use super::Database;
use crate::error::AppError;
use crate::models::Biometric;
use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

/// Rows per INSERT statement (5 bound parameters each).
const INSERT_BATCH_ROWS: usize = 1000;

/// Bulk insert samples, silently keeping any existing `(date, type, source)` row.
///
/// Returns the number of rows actually inserted.
pub async fn insert_ignore(
    conn: &mut SqliteConnection,
    samples: &[Biometric],
) -> Result<u64, AppError> {
    let mut inserted = 0;
    for chunk in samples.chunks(INSERT_BATCH_ROWS) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO biometrics (date, type, value, unit, source) ");
        builder.push_values(chunk, |mut row, sample| {
            row.push_bind(sample.date)
                .push_bind(sample.metric_type.clone())
                .push_bind(sample.value)
                .push_bind(sample.unit.clone())
                .push_bind(sample.source.clone());
        });
        builder.push(" ON CONFLICT(date, type, source) DO NOTHING");

        let result = builder.build().execute(&mut *conn).await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

impl Database {
    /// Samples of the given types recorded after `since`.
    pub async fn biometrics_since(
        &self,
        types: &[&str],
        since: NaiveDateTime,
    ) -> Result<Vec<Biometric>, AppError> {
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT date, type, value, unit, source FROM biometrics WHERE date > ",
        );
        builder.push_bind(since).push(" AND type IN (");
        let mut separated = builder.separated(", ");
        for metric_type in types {
            separated.push_bind(metric_type.to_string());
        }
        separated.push_unseparated(") ORDER BY date");

        let rows = builder.build().fetch_all(self.pool()).await?;
        let mut samples = Vec::with_capacity(rows.len());
        for row in rows {
            samples.push(Biometric {
                date: row.try_get("date")?,
                metric_type: row.try_get("type")?,
                value: row.try_get("value")?,
                unit: row.try_get("unit")?,
                source: row.try_get("source")?,
            });
        }
        Ok(samples)
    }

    /// Total stored samples.
    pub async fn count_biometrics(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM biometrics")
            .fetch_one(self.pool())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hrv(hour: u32, value: f64) -> Biometric {
        Biometric {
            date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            metric_type: "heart_rate_variability".to_string(),
            value,
            unit: Some("ms".to_string()),
            source: "Apple Health".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_triple_is_ignored() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let first = insert_ignore(&mut tx, &[hrv(8, 55.0)]).await.unwrap();
        // Same triple, different value: existing row wins.
        let second = insert_ignore(&mut tx, &[hrv(8, 60.0), hrv(9, 48.0)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(db.count_biometrics().await.unwrap(), 2);

        let since = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let stored = db
            .biometrics_since(&["heart_rate_variability"], since)
            .await
            .unwrap();
        assert_eq!(stored[0].value, 55.0);
    }

    #[tokio::test]
    async fn test_large_batch_spans_statements() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let samples: Vec<Biometric> = (0..2500)
            .map(|i| Biometric {
                date: base + chrono::Duration::minutes(i),
                metric_type: "heart_rate".to_string(),
                value: 60.0,
                unit: Some("count/min".to_string()),
                source: "Apple Health".to_string(),
            })
            .collect();

        let mut tx = db.begin().await.unwrap();
        let inserted = insert_ignore(&mut tx, &samples).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(inserted, 2500);
    }
}

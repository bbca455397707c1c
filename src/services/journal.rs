// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training journal kept in a spreadsheet.
//!
//! Rows arrive as header → cell maps. Sheet headers are free text
//! ("RPE (Exertion)", "Mood / Motivation "), so columns are located by
//! case-insensitive keyword match once per sync.

use crate::error::AppError;
use crate::models::JournalEntry;
use crate::time_utils::parse_date;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// One sheet row keyed by header text.
pub type JournalRow = Map<String, Value>;

/// Anything that can hand over the journal as row maps.
#[async_trait]
pub trait JournalSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<JournalRow>, AppError>;
}

// ─── Google Sheets values API ────────────────────────────────

/// Reads a worksheet range through the Sheets v4 `values` endpoint.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: String, range: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id,
            range,
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// First row is the header; later rows may be shorter than it.
fn rows_from_values(values: Vec<Vec<Value>>) -> Vec<JournalRow> {
    let mut values = values.into_iter();
    let Some(headers) = values.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = headers
        .into_iter()
        .map(|h| match h {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();

    values
        .map(|cells| {
            headers
                .iter()
                .cloned()
                .zip(cells.into_iter().chain(std::iter::repeat(Value::String(String::new()))))
                .collect()
        })
        .collect()
}

#[async_trait]
impl JournalSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Vec<JournalRow>, AppError> {
        let url = format!(
            "{}/{}/values/{}",
            self.base_url, self.spreadsheet_id, self.range
        );

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Sheets(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Sheets(format!("HTTP {}: {}", status, body)));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::Sheets(format!("JSON parse error: {}", e)))?;

        let rows = rows_from_values(range.values);
        tracing::info!(rows = rows.len(), "Fetched journal rows");
        Ok(rows)
    }
}

/// Fixed rows, for tests and imports of an exported sheet.
pub struct StaticJournalSource {
    rows: Vec<JournalRow>,
}

impl StaticJournalSource {
    pub fn new(rows: Vec<JournalRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl JournalSource for StaticJournalSource {
    async fn fetch_rows(&self) -> Result<Vec<JournalRow>, AppError> {
        Ok(self.rows.clone())
    }
}

// ─── Header mapping ──────────────────────────────────────────

/// Sheet header matched for each journal column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub date: String,
    pub rpe: Option<String>,
    pub mood: Option<String>,
    pub soreness: Option<String>,
    pub knee_pain: Option<String>,
    pub sleep_quality: Option<String>,
    pub notes: Option<String>,
}

fn find_header(headers: &[&str], keyword: &str) -> Option<String> {
    let keyword = keyword.to_lowercase();
    let found = headers
        .iter()
        .find(|h| h.to_lowercase().contains(&keyword))
        .map(|h| h.to_string());
    if found.is_none() {
        tracing::warn!(keyword = %keyword, "No journal column matches keyword");
    }
    found
}

/// Locate journal columns among `headers`. `None` without a date column.
pub fn build_column_map(headers: &[&str]) -> Option<ColumnMap> {
    Some(ColumnMap {
        date: find_header(headers, "Date")?,
        rpe: find_header(headers, "RPE"),
        mood: find_header(headers, "Mood"),
        soreness: find_header(headers, "Soreness"),
        knee_pain: find_header(headers, "Knee"),
        sleep_quality: find_header(headers, "Sleep"),
        notes: find_header(headers, "Notes"),
    })
}

// ─── Row normalization ───────────────────────────────────────

fn cell<'a>(row: &'a JournalRow, column: Option<&String>) -> Option<&'a Value> {
    match row.get(column?)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other),
    }
}

/// Numeric cell; free text in a numeric column is dropped to NULL.
fn number_cell(row: &JournalRow, column: Option<&String>) -> Option<f64> {
    let value = cell(row, column)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        tracing::debug!(column = ?column, value = %value, "Ignoring non-numeric journal cell");
    }
    parsed
}

fn text_cell(row: &JournalRow, column: Option<&String>) -> Option<String> {
    match cell(row, column)? {
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

/// Turn sheet rows into journal entries; rows without a usable date are skipped.
pub fn normalize_rows(rows: &[JournalRow], columns: &ColumnMap) -> Vec<JournalEntry> {
    rows.iter()
        .filter_map(|row| {
            let raw_date = text_cell(row, Some(&columns.date))?;
            let Some(date) = parse_date(&raw_date) else {
                tracing::debug!(raw_date = %raw_date, "Skipping journal row with bad date");
                return None;
            };

            Some(JournalEntry {
                date,
                rpe: number_cell(row, columns.rpe.as_ref()),
                mood: number_cell(row, columns.mood.as_ref()),
                soreness: number_cell(row, columns.soreness.as_ref()),
                knee_pain: number_cell(row, columns.knee_pain.as_ref()),
                sleep_quality: number_cell(row, columns.sleep_quality.as_ref()),
                notes: text_cell(row, columns.notes.as_ref()),
            })
        })
        .collect()
}

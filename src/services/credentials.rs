// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value credential store for the rotating Strava tokens.
//!
//! Production uses a `.env`-style file so refreshed tokens survive restarts;
//! lookups fall back to the process environment for keys the file lacks.

use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub const STRAVA_ACCESS_TOKEN: &str = "STRAVA_ACCESS_TOKEN";
pub const STRAVA_REFRESH_TOKEN: &str = "STRAVA_REFRESH_TOKEN";
pub const STRAVA_TOKEN_EXPIRES_AT: &str = "STRAVA_TOKEN_EXPIRES_AT";

/// Where credentials are read from and written back to.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Set several keys at once, replacing existing values.
    async fn set(&self, entries: &[(&str, String)]) -> Result<(), AppError>;
}

// ─── .env file store ─────────────────────────────────────────

/// Credentials kept as `KEY=value` lines in a file.
pub struct EnvFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_contents(&self) -> Result<String, AppError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(AppError::Credentials(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Replace `KEY=...` lines in place, appending keys that weren't present.
fn upsert_lines(contents: &str, entries: &[(&str, String)]) -> String {
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();

    for (key, value) in entries {
        let prefix = format!("{}=", key);
        let new_line = format!("{}={}", key, value);
        match lines.iter_mut().find(|line| line.starts_with(&prefix)) {
            Some(line) => *line = new_line,
            None => lines.push(new_line),
        }
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    updated
}

#[async_trait]
impl CredentialStore for EnvFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let contents = self.read_contents().await?;
        let parsed = dotenvy::from_read_iter(contents.as_bytes());
        for item in parsed {
            let (k, v) = item.map_err(|e| {
                AppError::Credentials(format!("Malformed {}: {}", self.path.display(), e))
            })?;
            if k == key {
                return Ok(Some(v).filter(|v| !v.is_empty()));
            }
        }
        Ok(std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    async fn set(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let contents = self.read_contents().await?;
        let updated = upsert_lines(&contents, entries);

        // Write then rename so a crash never leaves a half-written file.
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, updated)
            .await
            .map_err(|e| AppError::Credentials(format!("Failed to write credentials: {}", e)))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AppError::Credentials(format!("Failed to replace credentials: {}", e)))?;

        tracing::info!(
            path = %self.path.display(),
            keys = entries.len(),
            "Credentials updated"
        );
        Ok(())
    }
}

// ─── In-memory store ─────────────────────────────────────────

/// Process-local store, used by tests and one-off runs.
#[derive(Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (k, v) in entries {
            store.values.insert(k.to_string(), v.to_string());
        }
        store
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        for (k, v) in entries {
            self.values.insert(k.to_string(), v.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_lines_replaces_and_appends() {
        let contents = "DATABASE_URL=sqlite://x.db\nSTRAVA_ACCESS_TOKEN=old\n";
        let updated = upsert_lines(
            contents,
            &[
                (STRAVA_ACCESS_TOKEN, "new".to_string()),
                (STRAVA_REFRESH_TOKEN, "r2".to_string()),
            ],
        );
        assert_eq!(
            updated,
            "DATABASE_URL=sqlite://x.db\nSTRAVA_ACCESS_TOKEN=new\nSTRAVA_REFRESH_TOKEN=r2\n"
        );
    }

    #[tokio::test]
    async fn test_env_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\nAPI_KEY=abc\n").unwrap();

        let store = EnvFileStore::new(&path);
        store
            .set(&[(STRAVA_ACCESS_TOKEN, "token-1".to_string())])
            .await
            .unwrap();

        assert_eq!(
            store.get(STRAVA_ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("token-1")
        );
        assert_eq!(store.get("API_KEY").await.unwrap().as_deref(), Some("abc"));

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.starts_with("# comment\n"));
    }

    #[tokio::test]
    async fn test_env_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = EnvFileStore::new(dir.path().join("absent.env"));
        assert_eq!(
            store.get("RUNLYTICS_TEST_SURELY_UNSET").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::with_entries(&[(STRAVA_REFRESH_TOKEN, "r1")]);
        assert_eq!(
            store.get(STRAVA_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("r1")
        );
        store
            .set(&[(STRAVA_REFRESH_TOKEN, "r2".to_string())])
            .await
            .unwrap();
        assert_eq!(
            store.get(STRAVA_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("r2")
        );
    }
}

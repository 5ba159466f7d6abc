// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store for per-chat monitoring configuration.
//!
//! One row per chat (a chat monitors at most one leaderboard; configuring a
//! new one replaces the row). The polling scheduler reads the enabled rows at
//! startup and flips `enabled` off when a session cookie is rejected.

use crate::error::AppError;
use crate::models::ChatConfig;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chat_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id TEXT NOT NULL UNIQUE,
    leaderboard_id TEXT NOT NULL,
    session_cookie TEXT NOT NULL,
    year INTEGER NOT NULL,
    poll_interval INTEGER NOT NULL DEFAULT 900,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_chat_id ON chat_configs(chat_id);
CREATE INDEX IF NOT EXISTS idx_enabled ON chat_configs(enabled);
";

const CONFIG_COLUMNS: &str = "chat_id, leaderboard_id, session_cookie, year, poll_interval, enabled";

/// Configuration database handle.
///
/// Queries are short single-row operations, so a single connection behind a
/// mutex is enough; the lock is held only for the duration of one statement.
#[derive(Clone)]
pub struct ConfigDb {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigDb {
    /// Open (creating if necessary) the database at `path` and apply the schema.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Database(format!("Failed to create {parent:?}: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("Failed to open {path:?}: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Database(format!("Failed to apply schema: {e}")))?;

        tracing::info!(path = %path.display(), "Configuration database ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Add or update the chat's configuration (one per chat).
    ///
    /// An existing row for the chat is replaced and re-enabled.
    pub async fn add_config(&self, config: &ChatConfig) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO chat_configs
                (chat_id, leaderboard_id, session_cookie, year, poll_interval, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)
             ON CONFLICT(chat_id) DO UPDATE SET
                leaderboard_id = excluded.leaderboard_id,
                session_cookie = excluded.session_cookie,
                year = excluded.year,
                poll_interval = excluded.poll_interval,
                enabled = 1,
                updated_at = CURRENT_TIMESTAMP",
            params![
                config.chat_id,
                config.leaderboard_id,
                config.session_cookie,
                config.year,
                config.poll_interval as i64,
            ],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            chat_id = %config.chat_id,
            leaderboard_id = %config.leaderboard_id,
            year = config.year,
            "Stored chat configuration"
        );
        Ok(())
    }

    /// Remove the chat's configuration. Returns false when none existed.
    pub async fn remove_config(&self, chat_id: &str) -> Result<bool, AppError> {
        let conn = self.conn.lock().await;
        let removed = conn
            .execute("DELETE FROM chat_configs WHERE chat_id = ?1", [chat_id])
            .map_err(|e| AppError::Database(e.to_string()))?;

        if removed == 0 {
            tracing::warn!(chat_id, "No configuration to remove");
        } else {
            tracing::info!(chat_id, "Removed chat configuration");
        }
        Ok(removed > 0)
    }

    /// Get the configuration for a chat, if any.
    pub async fn get_config_for_chat(&self, chat_id: &str) -> Result<Option<ChatConfig>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CONFIG_COLUMNS} FROM chat_configs WHERE chat_id = ?1"
            ))
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map([chat_id], row_to_config)
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.next()
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All enabled configurations, oldest first (startup task enumeration).
    pub async fn get_all_enabled(&self) -> Result<Vec<ChatConfig>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CONFIG_COLUMNS} FROM chat_configs WHERE enabled = 1 ORDER BY created_at"
            ))
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], row_to_config)
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Disable a configuration without deleting it (bad-credential path).
    pub async fn disable_config(
        &self,
        chat_id: &str,
        leaderboard_id: &str,
        year: i32,
    ) -> Result<(), AppError> {
        self.set_enabled(chat_id, leaderboard_id, year, false).await
    }

    /// Re-enable a previously disabled configuration.
    pub async fn enable_config(
        &self,
        chat_id: &str,
        leaderboard_id: &str,
        year: i32,
    ) -> Result<(), AppError> {
        self.set_enabled(chat_id, leaderboard_id, year, true).await
    }

    async fn set_enabled(
        &self,
        chat_id: &str,
        leaderboard_id: &str,
        year: i32,
        enabled: bool,
    ) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE chat_configs SET enabled = ?1, updated_at = CURRENT_TIMESTAMP
             WHERE chat_id = ?2 AND leaderboard_id = ?3 AND year = ?4",
            params![enabled, chat_id, leaderboard_id, year],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(chat_id, leaderboard_id, year, enabled, "Updated enabled flag");
        Ok(())
    }
}

fn row_to_config(row: &Row<'_>) -> rusqlite::Result<ChatConfig> {
    Ok(ChatConfig {
        chat_id: row.get(0)?,
        leaderboard_id: row.get(1)?,
        session_cookie: row.get(2)?,
        year: row.get(3)?,
        poll_interval: row.get::<_, i64>(4)?.max(0) as u64,
        enabled: row.get(5)?,
    })
}

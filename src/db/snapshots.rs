// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable single-slot snapshot persistence.
//!
//! One JSON file per (chat, leaderboard, year) holding only the most recent
//! snapshot. Saves go through a temp file and an atomic rename, so a
//! concurrent load sees either the old or the new snapshot, never a torn
//! write. A missing or corrupt slot loads as `None`, which re-establishes the
//! first-poll baseline (one silent cycle, no notifications).

use crate::error::AppError;
use crate::models::{Snapshot, TaskKey};
use std::path::{Path, PathBuf};

/// File-backed snapshot store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Load the last saved snapshot for `key`, or `None` when there is none.
    ///
    /// Read and parse failures are logged and treated as "never polled"; they
    /// must not take the polling loop down.
    pub async fn load(&self, key: &TaskKey) -> Option<Snapshot> {
        let path = self.slot_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No previous snapshot");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read snapshot, starting fresh");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt snapshot file, starting fresh");
                None
            }
        }
    }

    /// Atomically replace the slot for `key` with `snapshot`.
    pub async fn save(&self, key: &TaskKey, snapshot: &Snapshot) -> Result<(), AppError> {
        let path = self.slot_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Persistence(format!("create {parent:?}: {e}")))?;
        }

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AppError::Persistence(format!("serialize snapshot: {e}")))?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| AppError::Persistence(format!("write {tmp:?}: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Persistence(format!("rename {tmp:?}: {e}")))?;

        tracing::debug!(path = %path.display(), "Saved snapshot");
        Ok(())
    }

    /// Slot file for a task key. Negative chat ids (Telegram groups) would
    /// put a `-` in the name, so it is sanitized to `n`.
    fn slot_path(&self, key: &TaskKey) -> PathBuf {
        let chat = key.chat_id.replace('-', "n");
        self.data_dir.join(format!(
            "state_{}_{}_{}.json",
            chat, key.leaderboard_id, key.year
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_path_sanitizes_negative_chat_ids() {
        let store = SnapshotStore::new("/tmp/aoc");
        let key = TaskKey {
            chat_id: "-100123".to_string(),
            leaderboard_id: "4567".to_string(),
            year: 2025,
        };
        assert_eq!(
            store.slot_path(&key),
            PathBuf::from("/tmp/aoc/state_n100123_4567_2025.json")
        );
    }
}

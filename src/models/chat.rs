// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-chat monitoring configuration and task identity.

use std::fmt;

/// Configuration row for one chat's monitored leaderboard.
///
/// Each chat monitors at most one leaderboard; configuring a new one
/// replaces the previous row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Telegram chat id (stringified; group ids are negative)
    pub chat_id: String,
    /// AoC private leaderboard id
    pub leaderboard_id: String,
    /// AoC session cookie, stored with its `session=` prefix
    pub session_cookie: String,
    /// Event year
    pub year: i32,
    /// Seconds between polls
    pub poll_interval: u64,
    /// Disabled configs are skipped at startup and never polled
    pub enabled: bool,
}

/// Identity of one polling task and of its persisted snapshot slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub chat_id: String,
    pub leaderboard_id: String,
    pub year: i32,
}

impl TaskKey {
    pub fn for_config(config: &ChatConfig) -> Self {
        Self {
            chat_id: config.chat_id.clone(),
            leaderboard_id: config.leaderboard_id.clone(),
            year: config.year,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.chat_id, self.leaderboard_id, self.year
        )
    }
}

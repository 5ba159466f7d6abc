// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Advent of Code private leaderboard API client.
//!
//! Handles:
//! - Authenticated leaderboard fetches (session cookie)
//! - Retry with backoff for rate limits and server errors
//! - Mapping HTTP outcomes onto the error kinds the polling loop
//!   distinguishes (only `Unauthorized` is fatal for a task)
//! - Processing the raw response into a [`Snapshot`]

use crate::models::{ChatConfig, CompletedDays, MemberState, Snapshot};
use crate::services::poller::LeaderboardSource;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const USER_AGENT: &str = "aoc-tracker (github.com/rolandd/aoc-tracker)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Error kinds for a leaderboard fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AocApiError {
    #[error("Authentication failed. Check your session cookie.")]
    Unauthorized,

    #[error("Leaderboard {0} not found. Check the ID.")]
    NotFound(String),

    #[error("Rate limited by adventofcode.com")]
    RateLimited,

    #[error("AoC server error (HTTP {0})")]
    Server(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed leaderboard response: {0}")]
    Malformed(String),
}

impl AocApiError {
    /// Whether this failure means the stored credential is bad and retrying
    /// is pointless.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// AoC API client.
#[derive(Clone)]
pub struct AocClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for AocClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AocClient {
    pub fn new() -> Self {
        Self::with_base_url("https://adventofcode.com")
    }

    /// Client against an alternate endpoint (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Fetch the raw leaderboard JSON for one configuration.
    ///
    /// Retries up to three times on rate limits, server errors, timeouts and
    /// transport failures; authentication and not-found errors fail
    /// immediately.
    pub async fn fetch_leaderboard(
        &self,
        session_cookie: &str,
        leaderboard_id: &str,
        year: i32,
    ) -> Result<RawLeaderboard, AocApiError> {
        let url = format!(
            "{}/{}/leaderboard/private/view/{}.json",
            self.base_url, year, leaderboard_id
        );

        let mut delay = INITIAL_RETRY_DELAY;
        let mut last_error = AocApiError::Transport("no attempts made".to_string());

        for attempt in 1..=MAX_ATTEMPTS {
            tracing::debug!(leaderboard_id, attempt, "Fetching leaderboard");

            let response = match self
                .http
                .get(&url)
                .header(reqwest::header::COOKIE, session_cookie)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = if e.is_timeout() {
                        AocApiError::Timeout
                    } else {
                        AocApiError::Transport(e.to_string())
                    };
                    tracing::warn!(leaderboard_id, attempt, error = %last_error, "Request failed");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
            };

            let status = response.status().as_u16();
            match status {
                401 => return Err(AocApiError::Unauthorized),
                404 => return Err(AocApiError::NotFound(leaderboard_id.to_string())),
                429 => {
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                    tracing::warn!(
                        leaderboard_id,
                        delay_secs = delay.as_secs(),
                        "Rate limited, backing off"
                    );
                    last_error = AocApiError::RateLimited;
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
                500.. => {
                    tracing::warn!(leaderboard_id, status, "AoC server error, retrying");
                    last_error = AocApiError::Server(status);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
                400.. => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AocApiError::Transport(format!("HTTP {status}: {body}")));
                }
                _ => {}
            }

            return response
                .json()
                .await
                .map_err(|e| AocApiError::Malformed(e.to_string()));
        }

        Err(last_error)
    }

    /// Fetch and process a configuration's leaderboard into a snapshot.
    pub async fn fetch_snapshot(&self, config: &ChatConfig) -> Result<Snapshot, AocApiError> {
        let raw = self
            .fetch_leaderboard(&config.session_cookie, &config.leaderboard_id, config.year)
            .await?;
        Ok(raw.into_snapshot(chrono::Utc::now().timestamp()))
    }
}

#[async_trait::async_trait]
impl LeaderboardSource for AocClient {
    async fn fetch(&self, config: &ChatConfig) -> Result<Snapshot, AocApiError> {
        self.fetch_snapshot(config).await
    }
}

/// Raw leaderboard response as served by the AoC API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLeaderboard {
    #[serde(default)]
    pub members: HashMap<String, RawMember>,
}

/// One member in the raw response. `name` is null for anonymous users, and
/// `completion_day_level` maps day -> part -> star metadata we ignore.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMember {
    pub name: Option<String>,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub local_score: i64,
    #[serde(default)]
    pub completion_day_level: HashMap<String, HashMap<String, serde_json::Value>>,
}

impl RawLeaderboard {
    /// Process the raw response into a typed snapshot, deriving rankings and
    /// competition ranks.
    pub fn into_snapshot(self, observed_at: i64) -> Snapshot {
        let members: BTreeMap<String, MemberState> = self
            .members
            .into_iter()
            .map(|(id, raw)| {
                let mut completed_days = CompletedDays::default();
                for (day_str, parts) in &raw.completion_day_level {
                    let Ok(day) = day_str.parse::<u8>() else {
                        continue;
                    };
                    for part_str in parts.keys() {
                        if let Ok(part) = part_str.parse::<u8>() {
                            completed_days.insert(day, part);
                        }
                    }
                }

                let member = MemberState {
                    name: raw.name.unwrap_or_else(|| format!("User {id}")),
                    id: id.clone(),
                    score: raw.local_score,
                    stars: raw.stars,
                    rank: 0,
                    completed_days,
                };
                (id, member)
            })
            .collect();

        Snapshot::new(observed_at, members)
    }
}

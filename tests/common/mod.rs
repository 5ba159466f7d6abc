// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fixtures for integration tests: snapshot builders, a scripted
//! leaderboard source and a recording event sink.

use aoc_tracker::db::{ConfigDb, SnapshotStore};
use aoc_tracker::error::AppError;
use aoc_tracker::models::{ChangeEvent, ChatConfig, CompletedDays, MemberState, Snapshot};
use aoc_tracker::services::aoc::AocApiError;
use aoc_tracker::services::poller::{EventSink, LeaderboardSource, PollingManager};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn member(id: &str, score: i64, days: &[(u8, u8)]) -> MemberState {
    let mut completed_days = CompletedDays::default();
    for &(day, part) in days {
        completed_days.insert(day, part);
    }
    MemberState {
        id: id.to_string(),
        name: format!("Name {id}"),
        score,
        stars: completed_days.star_count(),
        rank: 0,
        completed_days,
    }
}

#[allow(dead_code)]
pub fn snapshot(members: Vec<MemberState>) -> Snapshot {
    let map: BTreeMap<String, MemberState> =
        members.into_iter().map(|m| (m.id.clone(), m)).collect();
    Snapshot::new(1_700_000_000, map)
}

#[allow(dead_code)]
pub fn chat_config(chat_id: &str, leaderboard_id: &str) -> ChatConfig {
    ChatConfig {
        chat_id: chat_id.to_string(),
        leaderboard_id: leaderboard_id.to_string(),
        session_cookie: "session=test".to_string(),
        year: 2025,
        poll_interval: 1,
        enabled: true,
    }
}

/// Scripted per-chat fetch results; once a script runs dry the last
/// successful snapshot repeats (a quiet leaderboard).
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, Script>>,
    fetches: AtomicUsize,
}

#[derive(Default)]
struct Script {
    queue: VecDeque<Result<Snapshot, AocApiError>>,
    repeat: Option<Snapshot>,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, chat_id: &str, result: Result<Snapshot, AocApiError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .queue
            .push_back(result);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LeaderboardSource for ScriptedSource {
    async fn fetch(&self, config: &ChatConfig) -> Result<Snapshot, AocApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(config.chat_id.clone()).or_default();
        match script.queue.pop_front() {
            Some(Ok(snap)) => {
                script.repeat = Some(snap.clone());
                Ok(snap)
            }
            Some(Err(e)) => Err(e),
            None => script
                .repeat
                .clone()
                .ok_or_else(|| AocApiError::Transport("script exhausted".to_string())),
        }
    }
}

/// Records deliveries and notices instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingSink {
    pub deliveries: Mutex<Vec<(String, Vec<ChangeEvent>)>>,
    pub notices: Mutex<Vec<(String, String)>>,
    pub fail_deliveries: std::sync::atomic::AtomicBool,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn notice_count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn deliver(&self, chat_id: &str, events: &[ChangeEvent]) -> Result<(), AppError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((chat_id.to_string(), events.to_vec()));
        if self.fail_deliveries.load(Ordering::SeqCst) {
            return Err(AppError::Telegram("sink down".to_string()));
        }
        Ok(())
    }

    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        self.notices
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Build a manager over temp storage with the given fakes.
#[allow(dead_code)]
pub async fn test_manager(
    dir: &TempDir,
    source: Arc<ScriptedSource>,
    sink: Arc<RecordingSink>,
) -> (PollingManager, ConfigDb) {
    let db = ConfigDb::open(&dir.path().join("config.db"))
        .await
        .expect("open config db");
    let store = SnapshotStore::new(dir.path().join("state"));
    let manager = PollingManager::new(db.clone(), store, source, sink);
    (manager, db)
}

/// Poll `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_until(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multi-chat leaderboard polling scheduler.
//!
//! One independent tokio task per (chat, leaderboard, year) key. Each task
//! owns its cycle: fetch, diff against the stored snapshot, deliver events,
//! persist, sleep until the next poll. Failures stay inside the task that hit
//! them; a chat with a dead cookie or a flaky network never affects a
//! sibling's loop, and the scheduler itself only adds, removes and reads.
//!
//! Cancellation is cooperative: every suspension point (the fetch and the
//! interval sleep) races a per-task [`CancellationToken`], so both
//! `remove_task` and process shutdown unblock promptly instead of waiting a
//! full interval.

use crate::db::{ConfigDb, SnapshotStore};
use crate::error::AppError;
use crate::models::{ChangeEvent, ChatConfig, Snapshot, TaskKey};
use crate::services::aoc::AocApiError;
use crate::services::detector;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Source of leaderboard snapshots (the AoC client in production, scripted
/// fakes in tests).
#[async_trait::async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn fetch(&self, config: &ChatConfig) -> Result<Snapshot, AocApiError>;
}

/// Destination for detected changes and one-off notices. Delivery is
/// best-effort; errors are logged by the caller, never fatal to a task.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, chat_id: &str, events: &[ChangeEvent]) -> Result<(), AppError>;
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), AppError>;
}

/// Run state of one polling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Stopped,
    Error,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

/// Status of a polling task.
///
/// Each entry is written only by its own loop (whole-struct replace);
/// readers get a clone, so a status query always sees a consistent struct,
/// at worst one cycle stale.
#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub state: TaskState,
    pub last_poll: Option<DateTime<Utc>>,
    pub next_poll: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Consecutive failures; reset to zero by the next successful cycle.
    pub error_count: u32,
}

impl TaskStatus {
    fn starting() -> Self {
        Self {
            state: TaskState::Running,
            last_poll: None,
            next_poll: Some(Utc::now()),
            error_message: None,
            error_count: 0,
        }
    }
}

struct TaskHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

type TaskMap = Arc<DashMap<TaskKey, TaskHandle>>;
type StatusMap = Arc<DashMap<TaskKey, TaskStatus>>;

/// Manages the set of per-chat polling tasks.
pub struct PollingManager {
    db: ConfigDb,
    store: SnapshotStore,
    source: Arc<dyn LeaderboardSource>,
    sink: Arc<dyn EventSink>,
    tasks: TaskMap,
    statuses: StatusMap,
    shutdown: CancellationToken,
}

impl PollingManager {
    pub fn new(
        db: ConfigDb,
        store: SnapshotStore,
        source: Arc<dyn LeaderboardSource>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            db,
            store,
            source,
            sink,
            tasks: Arc::new(DashMap::new()),
            statuses: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start polling for every enabled configuration.
    pub async fn start(&self) -> Result<(), AppError> {
        let configs = self.db.get_all_enabled().await?;
        tracing::info!(count = configs.len(), "Starting polling tasks");

        for config in configs {
            self.add_task(config);
        }
        Ok(())
    }

    /// Start a polling task for `config`. A no-op when the key already runs.
    pub fn add_task(&self, config: ChatConfig) {
        let key = TaskKey::for_config(&config);

        // The entry guard makes concurrent adds for one key race-free.
        match self.tasks.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                tracing::warn!(task = %key, "Task already running");
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let cancel = self.shutdown.child_token();
                self.statuses.insert(key.clone(), TaskStatus::starting());

                let ctx = TaskContext {
                    key: key.clone(),
                    config,
                    db: self.db.clone(),
                    store: self.store.clone(),
                    source: Arc::clone(&self.source),
                    sink: Arc::clone(&self.sink),
                    tasks: Arc::clone(&self.tasks),
                    statuses: Arc::clone(&self.statuses),
                    cancel: cancel.clone(),
                };
                let join = tokio::spawn(poll_loop(ctx));

                slot.insert(TaskHandle { cancel, join });
                tracing::info!(task = %key, "Started monitoring");
            }
        }
    }

    /// Stop the task for `key` and drop its status. A no-op when not running.
    pub async fn remove_task(&self, key: &TaskKey) {
        let Some((_, handle)) = self.tasks.remove(key) else {
            tracing::warn!(task = %key, "Task not running");
            return;
        };

        handle.cancel.cancel();
        if let Err(e) = handle.join.await {
            tracing::error!(task = %key, error = %e, "Polling task panicked");
        }
        self.statuses.remove(key);
        tracing::info!(task = %key, "Stopped monitoring");
    }

    /// Copy-on-read status for one task.
    pub fn status(&self, key: &TaskKey) -> Option<TaskStatus> {
        self.statuses.get(key).map(|entry| entry.value().clone())
    }

    /// Statuses of all tasks belonging to a chat.
    pub fn statuses_for_chat(&self, chat_id: &str) -> Vec<(TaskKey, TaskStatus)> {
        self.statuses
            .iter()
            .filter(|entry| entry.key().chat_id == chat_id)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Whether a loop currently runs for `key`.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks.contains_key(key)
    }

    /// Number of running tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel every task and wait until all loops have exited.
    ///
    /// After this returns, no fetch or snapshot write is in flight.
    pub async fn stop(&self) {
        tracing::info!("Stopping polling manager");
        self.shutdown.cancel();

        let keys: Vec<TaskKey> = self.tasks.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, handle)) = self.tasks.remove(&key) {
                if let Err(e) = handle.join.await {
                    tracing::error!(task = %key, error = %e, "Polling task panicked");
                }
            }
        }
        tracing::info!("All polling tasks stopped");
    }
}

/// Everything one polling loop owns.
struct TaskContext {
    key: TaskKey,
    config: ChatConfig,
    db: ConfigDb,
    store: SnapshotStore,
    source: Arc<dyn LeaderboardSource>,
    sink: Arc<dyn EventSink>,
    tasks: TaskMap,
    statuses: StatusMap,
    cancel: CancellationToken,
}

/// Polling loop for one (chat, leaderboard, year) key.
async fn poll_loop(ctx: TaskContext) {
    let interval = Duration::from_secs(ctx.config.poll_interval.max(1));
    tracing::info!(task = %ctx.key, interval_secs = interval.as_secs(), "Polling task started");

    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        let fetched = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            result = ctx.source.fetch(&ctx.config) => result,
        };

        match fetched {
            Ok(current) => run_cycle(&ctx, current, interval).await,
            Err(err) if err.is_auth_failure() => {
                // Retrying with the same bad cookie cannot succeed: tell the
                // chat once, disable the stored config, and end this task.
                tracing::warn!(task = %ctx.key, "Authentication failed, disabling configuration");
                mark_error(&ctx, err.to_string());

                let notice = format!(
                    "\u{274C} Session cookie invalid for leaderboard {}.\nPlease update it with /set_leaderboard.",
                    ctx.config.leaderboard_id
                );
                if let Err(e) = ctx.sink.notify(&ctx.config.chat_id, &notice).await {
                    tracing::error!(task = %ctx.key, error = %e, "Failed to notify chat");
                }
                if let Err(e) = ctx
                    .db
                    .disable_config(&ctx.config.chat_id, &ctx.config.leaderboard_id, ctx.config.year)
                    .await
                {
                    tracing::error!(task = %ctx.key, error = %e, "Failed to disable configuration");
                }
                break;
            }
            Err(err) => {
                // Transient: record it and keep polling on the normal
                // interval. The task is never auto-removed for these.
                tracing::error!(task = %ctx.key, error = %err, "Poll failed");
                mark_error(&ctx, err.to_string());
            }
        }

        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    // Fatal exits (auth failure) remove the task entry themselves so the key
    // can be re-added once credentials are fixed. For cancellation paths the
    // entry is already gone and this is a no-op.
    let _ = ctx.tasks.remove(&ctx.key);
    tracing::info!(task = %ctx.key, "Polling task stopped");
}

/// One successful-fetch cycle: diff, deliver, persist, update status.
async fn run_cycle(ctx: &TaskContext, current: Snapshot, interval: Duration) {
    let previous = ctx.store.load(&ctx.key).await;
    let events = detector::detect(previous.as_ref(), &current);

    if !events.is_empty() {
        tracing::info!(task = %ctx.key, events = events.len(), "Changes detected");
        if let Err(e) = ctx.sink.deliver(&ctx.config.chat_id, &events).await {
            // Best-effort: the snapshot must still be saved below so the
            // next diff stays anchored, even when delivery failed.
            tracing::warn!(task = %ctx.key, error = %e, "Event delivery failed");
        }
    }

    // Save unconditionally, also on no-change cycles.
    if let Err(e) = ctx.store.save(&ctx.key, &current).await {
        // A lost save would re-report the same changes next cycle, so it
        // counts as a cycle error, unlike a sink failure.
        tracing::error!(task = %ctx.key, error = %e, "Failed to persist snapshot");
        mark_error(ctx, e.to_string());
        return;
    }

    let now = Utc::now();
    ctx.statuses.insert(
        ctx.key.clone(),
        TaskStatus {
            state: TaskState::Running,
            last_poll: Some(now),
            next_poll: Some(now + ChronoDuration::seconds(interval.as_secs() as i64)),
            error_message: None,
            error_count: 0,
        },
    );
}

/// Record a failed cycle, preserving poll timestamps and bumping the
/// consecutive error count.
fn mark_error(ctx: &TaskContext, message: String) {
    let previous = ctx.statuses.get(&ctx.key).map(|e| e.value().clone());
    let (last_poll, next_poll, error_count) = match previous {
        Some(status) => (status.last_poll, status.next_poll, status.error_count + 1),
        None => (None, None, 1),
    };
    ctx.statuses.insert(
        ctx.key.clone(),
        TaskStatus {
            state: TaskState::Error,
            last_poll,
            next_poll,
            error_message: Some(message),
            error_count,
        },
    );
}

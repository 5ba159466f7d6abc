// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aoc;
pub mod detector;
pub mod formatter;
pub mod poller;
pub mod telegram;

pub use aoc::{AocApiError, AocClient};
pub use poller::{EventSink, LeaderboardSource, PollingManager, TaskState, TaskStatus};
pub use telegram::{TelegramClient, TelegramSink};

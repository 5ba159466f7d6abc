// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! AoC-Tracker: multi-chat Advent of Code leaderboard monitor
//!
//! This crate polls private AoC leaderboards on behalf of Telegram chats,
//! diffs successive snapshots, and notifies each chat of new stars, rank
//! moves, score changes and new members.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ConfigDb;
use services::{AocClient, PollingManager, TelegramClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: ConfigDb,
    pub aoc: AocClient,
    pub telegram: TelegramClient,
    pub poller: PollingManager,
}

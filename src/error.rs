// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

use crate::services::aoc::AocApiError;

/// Application error type used outside the fetch path.
///
/// The leaderboard fetch itself reports through [`AocApiError`], whose kinds
/// the polling loop needs to tell apart; everything else collapses here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("AoC API error: {0}")]
    AocApi(#[from] AocApiError),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Snapshot persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for fallible operations across the crate.
pub type Result<T> = std::result::Result<T, AppError>;

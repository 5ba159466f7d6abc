//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; the only required variable is the
//! Telegram bot token.

use std::env;
use std::path::PathBuf;

/// Default seconds between leaderboard polls when a chat does not set one.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 900;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token from @BotFather
    pub bot_token: String,
    /// Path to the SQLite configuration database
    pub database_path: PathBuf,
    /// Directory holding per-leaderboard snapshot state files
    pub data_dir: PathBuf,
    /// Default poll interval in seconds for newly configured leaderboards
    pub poll_interval_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            bot_token: "000000:test_token".to_string(),
            database_path: PathBuf::from("data/bot_config.db"),
            data_dir: PathBuf::from("data"),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        // BotFather tokens look like "123456:ABC-DEF...". A token without the
        // colon cannot be valid and fails fast here instead of on first send.
        if !bot_token.contains(':') {
            return Err(ConfigError::Invalid(
                "TELEGRAM_BOT_TOKEN",
                "expected 'TOKEN_ID:TOKEN_STRING' format",
            ));
        }

        Ok(Self {
            bot_token,
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/bot_config.db")),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

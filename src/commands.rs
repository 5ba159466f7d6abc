// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telegram command front end.
//!
//! A single long-polling loop receives updates and dispatches bot commands:
//! - `/set_leaderboard <id> <cookie> [year]` (admin) - configure and start
//! - `/remove_leaderboard` (admin) - stop and delete the configuration
//! - `/rankings` - current standings
//! - `/status` - polling task health
//! - `/start`, `/help` - usage text

use crate::models::{ChatConfig, TaskKey};
use crate::services::formatter;
use crate::services::poller::TaskState;
use crate::services::telegram::Message;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use chrono::Datelike;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Seconds the Bot API holds a getUpdates long poll open.
const UPDATE_POLL_TIMEOUT_SECS: u64 = 30;
/// Pause before retrying after a failed getUpdates call.
const UPDATE_RETRY_DELAY: Duration = Duration::from_secs(5);

const WELCOME_TEXT: &str = "\u{1F916} Advent of Code Leaderboard Bot\n\n\
I monitor your private AoC leaderboards and notify you of updates!\n\n\
Admin Commands:\n\
/set_leaderboard &lt;id&gt; &lt;cookie&gt; [year] - Set leaderboard\n\
/remove_leaderboard - Stop monitoring\n\n\
Everyone Can Use:\n\
/rankings - Show current rankings\n\
/status - Show monitoring status\n\
/help - Show detailed help";

const HELP_TEXT: &str = "How to use the bot:\n\n\
1. Set a leaderboard (admin only):\n\
   /set_leaderboard &lt;leaderboard_id&gt; &lt;session_cookie&gt; [year]\n\n\
   Example: /set_leaderboard 123456 abc123def456 2025\n\n\
   The leaderboard ID is in your private leaderboard URL, and the session\n\
   cookie comes from your browser's DevTools (Application \u{2192} Cookies \u{2192}\n\
   adventofcode.com \u{2192} session). Each chat monitors one leaderboard;\n\
   setting a new one replaces it.\n\n\
2. /rankings - show the current standings\n\
3. /status - show monitoring status and next poll time\n\
4. /remove_leaderboard - stop monitoring (admin only)";

const SET_USAGE: &str = "Usage: /set_leaderboard &lt;leaderboard_id&gt; &lt;session_cookie&gt; [year]\n\n\
Example: /set_leaderboard 123456 abc123def456 2025";

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    SetLeaderboard {
        leaderboard_id: String,
        session_cookie: String,
        year: Option<i32>,
    },
    RemoveLeaderboard,
    Rankings,
    Status,
}

impl Command {
    /// Parse a message text into a command.
    ///
    /// Returns `None` for non-commands and unknown commands, and
    /// `Some(Err(usage))` when a known command has bad arguments.
    pub fn parse(text: &str) -> Option<Result<Self, String>> {
        let mut words = text.split_whitespace();
        let first = words.next()?;
        if !first.starts_with('/') {
            return None;
        }
        // Group chats address commands as "/status@BotName".
        let name = first[1..].split('@').next().unwrap_or_default();

        match name {
            "start" => Some(Ok(Self::Start)),
            "help" => Some(Ok(Self::Help)),
            "rankings" => Some(Ok(Self::Rankings)),
            "status" => Some(Ok(Self::Status)),
            "remove_leaderboard" => Some(Ok(Self::RemoveLeaderboard)),
            "set_leaderboard" => {
                let (Some(leaderboard_id), Some(cookie)) = (words.next(), words.next()) else {
                    return Some(Err(SET_USAGE.to_string()));
                };
                let year = match words.next() {
                    None => None,
                    Some(word) => match word.parse() {
                        Ok(year) => Some(year),
                        Err(_) => return Some(Err(SET_USAGE.to_string())),
                    },
                };
                Some(Ok(Self::SetLeaderboard {
                    leaderboard_id: leaderboard_id.to_string(),
                    session_cookie: cookie.to_string(),
                    year,
                }))
            }
            _ => None,
        }
    }
}

/// Receive updates and dispatch commands until `shutdown` fires.
pub async fn run_command_loop(state: Arc<AppState>, shutdown: CancellationToken) {
    tracing::info!("Command loop started");
    let mut offset: i64 = 0;

    loop {
        let updates = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = state.telegram.get_updates(offset, UPDATE_POLL_TIMEOUT_SECS) => result,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some(message) = update.message {
                        handle_message(&state, message).await;
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch updates");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(UPDATE_RETRY_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("Command loop stopped");
}

async fn handle_message(state: &Arc<AppState>, message: Message) {
    let Some(text) = message.text.clone() else {
        return;
    };
    let command = match Command::parse(&text) {
        None => return,
        Some(Err(usage)) => {
            reply(state, &message, &usage).await;
            return;
        }
        Some(Ok(command)) => command,
    };

    let chat_id = message.chat.id.to_string();
    tracing::debug!(chat_id = %chat_id, command = ?command, "Dispatching command");

    match command {
        Command::Start => reply(state, &message, WELCOME_TEXT).await,
        Command::Help => reply(state, &message, HELP_TEXT).await,
        Command::SetLeaderboard {
            leaderboard_id,
            session_cookie,
            year,
        } => {
            set_leaderboard(state, &message, leaderboard_id, session_cookie, year).await;
        }
        Command::RemoveLeaderboard => remove_leaderboard(state, &message).await,
        Command::Rankings => rankings(state, &message).await,
        Command::Status => status(state, &message).await,
    }
}

async fn set_leaderboard(
    state: &Arc<AppState>,
    message: &Message,
    leaderboard_id: String,
    session_cookie: String,
    year: Option<i32>,
) {
    if !require_admin(state, message).await {
        return;
    }
    let chat_id = message.chat.id.to_string();

    if !leaderboard_id.chars().all(|c| c.is_ascii_digit()) || leaderboard_id.is_empty() {
        reply(state, message, "\u{274C} Leaderboard ID must be numeric.").await;
        return;
    }

    let current_year = chrono::Utc::now().year();
    let year = year.unwrap_or(current_year);
    if !(2015..=current_year).contains(&year) {
        reply(
            state,
            message,
            &format!("\u{274C} Year must be between 2015 and {current_year}"),
        )
        .await;
        return;
    }

    // Accept the cookie with or without its "session=" prefix.
    let session_cookie = if session_cookie.starts_with("session=") {
        session_cookie
    } else {
        format!("session={session_cookie}")
    };

    let previous = match state.db.get_config_for_chat(&chat_id).await {
        Ok(previous) => previous,
        Err(e) => {
            tracing::error!(chat_id = %chat_id, error = %e, "Failed to look up configuration");
            reply(state, message, "\u{274C} Database error. Try again later.").await;
            return;
        }
    };
    if previous.is_some() {
        reply(
            state,
            message,
            "\u{2139} Replacing previous leaderboard configuration...",
        )
        .await;
    }

    let config = ChatConfig {
        chat_id: chat_id.clone(),
        leaderboard_id: leaderboard_id.clone(),
        session_cookie,
        year,
        poll_interval: state.config.poll_interval_secs,
        enabled: true,
    };

    // Prove the cookie and id work before anything is stored.
    reply(
        state,
        message,
        "\u{23F3} Testing connection to Advent of Code...",
    )
    .await;
    let snapshot = match state.aoc.fetch_snapshot(&config).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(chat_id = %chat_id, leaderboard_id = %leaderboard_id, error = %e, "Leaderboard test fetch failed");
            reply(
                state,
                message,
                &format!(
                    "\u{274C} Failed to connect to AoC:\n{e}\n\nPlease check:\n\
                     1. Your session cookie is correct\n\
                     2. Your leaderboard ID is correct\n\
                     3. You have access to the private leaderboard"
                ),
            )
            .await;
            return;
        }
    };

    if let Err(e) = state.db.add_config(&config).await {
        tracing::error!(chat_id = %chat_id, error = %e, "Failed to store configuration");
        reply(state, message, "\u{274C} Database error. Try again later.").await;
        return;
    }

    // A replaced configuration's old task keeps polling the old board unless
    // it is stopped here.
    if let Some(previous) = previous {
        let old_key = TaskKey::for_config(&previous);
        if old_key != TaskKey::for_config(&config) {
            state.poller.remove_task(&old_key).await;
        }
    }
    state.poller.add_task(config);

    reply(
        state,
        message,
        &format!(
            "\u{2705} Leaderboard {leaderboard_id} ({year}) configured!\n\n\
             \u{1F389} Monitoring started. You'll receive updates when the leaderboard changes.\n\n\
             Use /status to see monitoring details."
        ),
    )
    .await;

    // Post the standings the test fetch already returned.
    let messages = formatter::format_leaderboard(&snapshot, year);
    state.telegram.send_messages(&chat_id, &messages).await;
}

async fn remove_leaderboard(state: &Arc<AppState>, message: &Message) {
    if !require_admin(state, message).await {
        return;
    }
    let chat_id = message.chat.id.to_string();

    let config = match state.db.get_config_for_chat(&chat_id).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            reply(
                state,
                message,
                "\u{274C} No leaderboard configured for this chat.",
            )
            .await;
            return;
        }
        Err(e) => {
            tracing::error!(chat_id = %chat_id, error = %e, "Failed to look up configuration");
            reply(state, message, "\u{274C} Database error. Try again later.").await;
            return;
        }
    };

    state.poller.remove_task(&TaskKey::for_config(&config)).await;

    if let Err(e) = state.db.remove_config(&chat_id).await {
        tracing::error!(chat_id = %chat_id, error = %e, "Failed to remove configuration");
        reply(state, message, "\u{274C} Database error. Try again later.").await;
        return;
    }

    reply(state, message, "\u{2705} Leaderboard removed.\nMonitoring stopped.").await;
}

async fn rankings(state: &Arc<AppState>, message: &Message) {
    let chat_id = message.chat.id.to_string();

    let config = match state.db.get_config_for_chat(&chat_id).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            reply(
                state,
                message,
                "\u{274C} No leaderboard configured for this chat.\nUse /set_leaderboard to add one.",
            )
            .await;
            return;
        }
        Err(e) => {
            tracing::error!(chat_id = %chat_id, error = %e, "Failed to look up configuration");
            reply(state, message, "\u{274C} Database error. Try again later.").await;
            return;
        }
    };

    reply(state, message, "\u{23F3} Fetching leaderboard rankings...").await;

    match state.aoc.fetch_snapshot(&config).await {
        Ok(snapshot) => {
            let messages = formatter::format_leaderboard(&snapshot, config.year);
            state.telegram.send_messages(&chat_id, &messages).await;
        }
        Err(e) => {
            tracing::warn!(chat_id = %chat_id, error = %e, "Failed to fetch rankings");
            reply(
                state,
                message,
                &format!("\u{274C} Failed to fetch rankings:\n{e}"),
            )
            .await;
        }
    }
}

async fn status(state: &Arc<AppState>, message: &Message) {
    let chat_id = message.chat.id.to_string();

    let config = match state.db.get_config_for_chat(&chat_id).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(chat_id = %chat_id, error = %e, "Failed to look up configuration");
            reply(state, message, "\u{274C} Database error. Try again later.").await;
            return;
        }
    };
    let Some(config) = config else {
        reply(
            state,
            message,
            "No leaderboard configured.\nUse /set_leaderboard to add one!",
        )
        .await;
        return;
    };

    let mut lines = vec!["\u{1F4CA} Bot Status".to_string(), String::new()];
    lines.push(format!(
        "Leaderboard {} ({})",
        config.leaderboard_id, config.year
    ));

    match state.poller.status(&TaskKey::for_config(&config)) {
        Some(status) => {
            lines.push(format!("Status: {}", status.state.as_str().to_uppercase()));
            if let Some(last_poll) = status.last_poll {
                lines.push(format!("Last poll: {}", format_utc_rfc3339(last_poll)));
            }
            if status.state != TaskState::Stopped {
                if let Some(next_poll) = status.next_poll {
                    lines.push(format!("Next poll: {}", format_utc_rfc3339(next_poll)));
                }
            }
            if let Some(error) = &status.error_message {
                lines.push(format!("\u{26A0} Error: {error}"));
            }
            if status.error_count > 0 {
                lines.push(format!("Error count: {}", status.error_count));
            }
        }
        None => lines.push("Status: NOT RUNNING".to_string()),
    }
    if !config.enabled {
        lines.push("Configuration disabled (bad session cookie?)".to_string());
    }

    reply(state, message, &lines.join("\n")).await;
}

/// Check admin rights and reply with a refusal if missing.
async fn require_admin(state: &Arc<AppState>, message: &Message) -> bool {
    if is_admin(state, message).await {
        return true;
    }
    reply(
        state,
        message,
        "\u{274C} This command is only available to chat administrators.",
    )
    .await;
    false
}

/// Private chats have no admin list; the single user always qualifies.
async fn is_admin(state: &Arc<AppState>, message: &Message) -> bool {
    if message.chat.chat_type == "private" {
        return true;
    }
    let Some(from) = &message.from else {
        return false;
    };
    match state
        .telegram
        .get_chat_administrators(&message.chat.id.to_string())
        .await
    {
        Ok(admin_ids) => admin_ids.contains(&from.id),
        Err(e) => {
            tracing::error!(chat_id = message.chat.id, error = %e, "Failed to check admin status");
            false
        }
    }
}

async fn reply(state: &Arc<AppState>, message: &Message, text: &str) {
    let chat_id = message.chat.id.to_string();
    if let Err(e) = state.telegram.send_message(&chat_id, text).await {
        tracing::error!(chat_id = %chat_id, error = %e, "Failed to send reply");
    }
}

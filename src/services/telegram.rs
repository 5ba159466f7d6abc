// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telegram Bot API client and the event delivery sink.
//!
//! Handles:
//! - Sending notifications (HTML parse mode, paced to respect rate limits)
//! - Long-polling updates for the command front end
//! - Chat administrator lookup for admin-only commands

use crate::error::AppError;
use crate::models::ChangeEvent;
use crate::services::formatter;
use crate::services::poller::EventSink;
use serde::Deserialize;
use std::time::Duration;

/// Delay between consecutive messages to one chat.
const INTER_MESSAGE_DELAY: Duration = Duration::from_millis(500);

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        Self::with_base_url(format!("https://api.telegram.org/bot{bot_token}"))
    }

    /// Client against an alternate endpoint (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Send one message to a chat.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        let _: serde_json::Value = check_response(response).await?;
        tracing::debug!(chat_id, "Message sent");
        Ok(())
    }

    /// Send multiple messages with pacing between them.
    ///
    /// A failed send is logged and the remaining messages still go out; the
    /// notification stream should not die on one bad message.
    pub async fn send_messages(&self, chat_id: &str, messages: &[String]) {
        for (index, message) in messages.iter().enumerate() {
            if let Err(e) = self.send_message(chat_id, message).await {
                tracing::error!(
                    chat_id,
                    index = index + 1,
                    total = messages.len(),
                    error = %e,
                    "Failed to send message, continuing"
                );
            }
            if index + 1 < messages.len() {
                tokio::time::sleep(INTER_MESSAGE_DELAY).await;
            }
        }
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, AppError> {
        let url = format!("{}/getUpdates", self.base_url);
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            // Long poll: the server holds the request up to `timeout_secs`.
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        check_response(response).await
    }

    /// User ids of a chat's administrators.
    pub async fn get_chat_administrators(&self, chat_id: &str) -> Result<Vec<i64>, AppError> {
        let url = format!("{}/getChatAdministrators", self.base_url);
        let body = serde_json::json!({ "chat_id": chat_id });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        let members: Vec<ChatMember> = check_response(response).await?;
        Ok(members.into_iter().map(|m| m.user.id).collect())
    }
}

/// Unwrap the Bot API response envelope or surface its error description.
async fn check_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    let envelope: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| AppError::Telegram(format!("HTTP {status}: {e}")))?;

    if !envelope.ok {
        return Err(AppError::Telegram(
            envelope
                .description
                .unwrap_or_else(|| format!("HTTP {status}")),
        ));
    }

    envelope
        .result
        .ok_or_else(|| AppError::Telegram("response envelope without result".to_string()))
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One incoming update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// An incoming chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub text: Option<String>,
    pub chat: Chat,
    pub from: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    user: User,
}

/// Event sink delivering change notifications to Telegram.
#[derive(Clone)]
pub struct TelegramSink {
    client: TelegramClient,
}

impl TelegramSink {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl EventSink for TelegramSink {
    async fn deliver(&self, chat_id: &str, events: &[ChangeEvent]) -> Result<(), AppError> {
        let messages = formatter::format_changes(events);
        self.client.send_messages(chat_id, &messages).await;
        Ok(())
    }

    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        self.client.send_message(chat_id, text).await
    }
}

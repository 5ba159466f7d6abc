// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration store round trips: one row per chat, upsert-replace
//! semantics, and the enabled/disabled lifecycle.

use aoc_tracker::db::ConfigDb;
use aoc_tracker::models::ChatConfig;

mod common;
use common::chat_config;

async fn open_db(dir: &tempfile::TempDir) -> ConfigDb {
    ConfigDb::open(&dir.path().join("config.db"))
        .await
        .expect("open config db")
}

#[tokio::test]
async fn test_add_then_get_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open_db(&dir).await;

    let config = ChatConfig {
        chat_id: "-100123".to_string(),
        leaderboard_id: "4567".to_string(),
        session_cookie: "session=abc123".to_string(),
        year: 2024,
        poll_interval: 600,
        enabled: true,
    };
    db.add_config(&config).await.expect("add");

    let loaded = db
        .get_config_for_chat("-100123")
        .await
        .expect("query")
        .expect("row present");
    assert_eq!(loaded, config);

    assert!(db
        .get_config_for_chat("999")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn test_add_replaces_existing_row_and_reenables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open_db(&dir).await;

    let first = chat_config("42", "111");
    db.add_config(&first).await.expect("add");
    db.disable_config("42", "111", first.year)
        .await
        .expect("disable");

    let mut second = chat_config("42", "222");
    second.year = 2023;
    db.add_config(&second).await.expect("replace");

    let loaded = db
        .get_config_for_chat("42")
        .await
        .expect("query")
        .expect("row present");
    assert_eq!(loaded.leaderboard_id, "222");
    assert_eq!(loaded.year, 2023);
    assert!(loaded.enabled);

    // Still exactly one row for the chat.
    assert_eq!(db.get_all_enabled().await.expect("enumerate").len(), 1);
}

#[tokio::test]
async fn test_disable_and_enable_drive_the_enabled_enumeration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open_db(&dir).await;

    let a = chat_config("1", "11");
    let b = chat_config("2", "22");
    db.add_config(&a).await.expect("add a");
    db.add_config(&b).await.expect("add b");
    assert_eq!(db.get_all_enabled().await.expect("enumerate").len(), 2);

    db.disable_config("1", "11", a.year).await.expect("disable");
    let enabled = db.get_all_enabled().await.expect("enumerate");
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].chat_id, "2");

    // The disabled row is retained, just excluded from enumeration.
    let stored = db
        .get_config_for_chat("1")
        .await
        .expect("query")
        .expect("row kept");
    assert!(!stored.enabled);

    db.enable_config("1", "11", a.year).await.expect("enable");
    assert_eq!(db.get_all_enabled().await.expect("enumerate").len(), 2);
}

#[tokio::test]
async fn test_disable_requires_matching_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open_db(&dir).await;

    let config = chat_config("42", "99");
    db.add_config(&config).await.expect("add");

    // Wrong leaderboard id leaves the row untouched.
    db.disable_config("42", "other", config.year)
        .await
        .expect("disable");
    assert_eq!(db.get_all_enabled().await.expect("enumerate").len(), 1);
}

#[tokio::test]
async fn test_remove_reports_whether_a_row_existed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open_db(&dir).await;

    db.add_config(&chat_config("42", "99")).await.expect("add");

    assert!(db.remove_config("42").await.expect("remove"));
    assert!(db.get_config_for_chat("42").await.expect("query").is_none());
    assert!(!db.remove_config("42").await.expect("second remove"));
}

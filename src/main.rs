// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AoC-Tracker bot entry point
//!
//! Starts the polling scheduler for every enabled chat configuration and the
//! Telegram command loop, then waits for Ctrl-C and drains both cleanly.

use aoc_tracker::{
    commands,
    config::Config,
    db::{ConfigDb, SnapshotStore},
    services::{AocClient, PollingManager, TelegramClient, TelegramSink},
    AppState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        database = %config.database_path.display(),
        data_dir = %config.data_dir.display(),
        "Starting AoC-Tracker"
    );

    // Open the configuration database
    let db = ConfigDb::open(&config.database_path)
        .await
        .expect("Failed to open configuration database");

    let store = SnapshotStore::new(&config.data_dir);
    let aoc = AocClient::new();
    let telegram = TelegramClient::new(&config.bot_token);
    let sink = TelegramSink::new(telegram.clone());

    // Start polling every enabled configuration
    let poller = PollingManager::new(db.clone(), store, Arc::new(aoc.clone()), Arc::new(sink));
    poller
        .start()
        .await
        .expect("Failed to enumerate enabled configurations");
    tracing::info!(tasks = poller.task_count(), "Polling tasks started");

    let state = Arc::new(AppState {
        config,
        db,
        aoc,
        telegram,
        poller,
    });

    // Run the command front end until shutdown
    let shutdown = CancellationToken::new();
    let command_loop = tokio::spawn(commands::run_command_loop(
        Arc::clone(&state),
        shutdown.child_token(),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    shutdown.cancel();
    state.poller.stop().await;
    let _ = command_loop.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize structured logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aoc_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

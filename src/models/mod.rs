// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod chat;
pub mod events;
pub mod snapshot;

pub use chat::{ChatConfig, TaskKey};
pub use events::ChangeEvent;
pub use snapshot::{CompletedDays, MemberState, Snapshot, EVENT_DAYS};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Change events produced by diffing two leaderboard snapshots.

/// A single detected change between two snapshots of the same leaderboard.
///
/// Events are ephemeral: constructed by the detector, handed to the delivery
/// sink, then dropped. They are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A member completed a puzzle part.
    NewStar {
        member_id: String,
        member_name: String,
        day: u8,
        part: u8,
        /// True when this event means the day is fully solved: always for
        /// part 2, and for part 1 when part 2 is already present in the
        /// current snapshot (both parts appeared between two polls).
        completes_day: bool,
    },
    /// A member's competition rank changed.
    RankChange {
        member_id: String,
        member_name: String,
        old_rank: u32,
        new_rank: u32,
    },
    /// A member's local score changed.
    ScoreChange {
        member_id: String,
        member_name: String,
        old_score: i64,
        new_score: i64,
    },
    /// A member appeared on the leaderboard for the first time.
    NewMember {
        member_id: String,
        member_name: String,
    },
}

impl ChangeEvent {
    /// Id of the member this event concerns.
    pub fn member_id(&self) -> &str {
        match self {
            Self::NewStar { member_id, .. }
            | Self::RankChange { member_id, .. }
            | Self::ScoreChange { member_id, .. }
            | Self::NewMember { member_id, .. } => member_id,
        }
    }
}

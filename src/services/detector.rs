// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Change detection between two leaderboard snapshots.
//!
//! [`detect`] is a pure function over two snapshots of the same leaderboard.
//! It never performs I/O and holds no state; determinism comes from the
//! snapshot's alphabetical member order and fixed day/part iteration.

use crate::models::{ChangeEvent, Snapshot, EVENT_DAYS};
use std::collections::HashSet;

/// Diff `current` against `previous` and return the ordered change events.
///
/// Rules:
/// - `previous` absent (first observation) yields no events; the first poll
///   only establishes a baseline, so pre-existing members and stars are
///   never announced.
/// - Members present only in `previous` are ignored; there is no
///   member-removed event.
/// - A member who earned a star in this diff gets no separate `ScoreChange`
///   (the star already explains the delta).
/// - Event order: all `NewStar` (member id ascending, then day, then part),
///   all `RankChange`, all `ScoreChange`, all `NewMember`.
pub fn detect(previous: Option<&Snapshot>, current: &Snapshot) -> Vec<ChangeEvent> {
    let Some(previous) = previous else {
        tracing::info!("First observation, establishing baseline without events");
        return Vec::new();
    };

    let mut new_stars = Vec::new();
    let mut rank_changes = Vec::new();
    let mut score_changes = Vec::new();
    let mut new_members = Vec::new();
    let mut starred: HashSet<&str> = HashSet::new();

    for (id, member) in &current.members {
        let Some(old) = previous.members.get(id) else {
            new_members.push(ChangeEvent::NewMember {
                member_id: id.clone(),
                member_name: member.name.clone(),
            });
            continue;
        };

        for day in 1..=EVENT_DAYS {
            for part in [1u8, 2] {
                if member.completed_days.contains(day, part)
                    && !old.completed_days.contains(day, part)
                {
                    // Part 2 always completes the day; a new part 1 does too
                    // when part 2 arrived within the same polling window.
                    let completes_day = part == 2 || member.completed_days.contains(day, 2);
                    new_stars.push(ChangeEvent::NewStar {
                        member_id: id.clone(),
                        member_name: member.name.clone(),
                        day,
                        part,
                        completes_day,
                    });
                    starred.insert(id.as_str());
                }
            }
        }

        if member.rank != old.rank {
            rank_changes.push(ChangeEvent::RankChange {
                member_id: id.clone(),
                member_name: member.name.clone(),
                old_rank: old.rank,
                new_rank: member.rank,
            });
        }

        if member.score != old.score && !starred.contains(id.as_str()) {
            score_changes.push(ChangeEvent::ScoreChange {
                member_id: id.clone(),
                member_name: member.name.clone(),
                old_score: old.score,
                new_score: member.score,
            });
        }
    }

    let mut events = new_stars;
    events.append(&mut rank_changes);
    events.append(&mut score_changes);
    events.append(&mut new_members);
    events
}

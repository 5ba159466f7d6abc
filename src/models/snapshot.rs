// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point-in-time leaderboard observation.
//!
//! A [`Snapshot`] is a fully processed view of one private leaderboard:
//! members keyed by id, per-day/part completion, and competition ranks
//! recomputed from scores. Snapshots from the same leaderboard are the inputs
//! to change detection; snapshots from different leaderboards are not
//! comparable.

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of puzzle days in one event.
pub const EVENT_DAYS: u8 = 25;

/// Per-day puzzle completion, one bit per part.
///
/// A day with no completed parts simply has a zero byte, so "day absent" and
/// "empty part set" cannot diverge. Out-of-range days or parts are ignored on
/// insert; the upstream API never produces them.
///
/// Serializes as a map of day number to sorted part list (`{"1": [1, 2]}`),
/// the same shape the state files have always used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletedDays {
    days: [u8; EVENT_DAYS as usize],
}

impl CompletedDays {
    /// Mark `part` of `day` as completed. Ignores out-of-range input.
    pub fn insert(&mut self, day: u8, part: u8) {
        if (1..=EVENT_DAYS).contains(&day) && (1..=2).contains(&part) {
            self.days[usize::from(day) - 1] |= 1 << (part - 1);
        }
    }

    /// Whether `part` of `day` is completed.
    pub fn contains(&self, day: u8, part: u8) -> bool {
        if !(1..=EVENT_DAYS).contains(&day) || !(1..=2).contains(&part) {
            return false;
        }
        self.days[usize::from(day) - 1] & (1 << (part - 1)) != 0
    }

    /// Completed parts of `day`, ascending.
    pub fn parts(&self, day: u8) -> Vec<u8> {
        [1u8, 2]
            .into_iter()
            .filter(|&part| self.contains(day, part))
            .collect()
    }

    /// Total completed parts across all days.
    pub fn star_count(&self) -> u32 {
        self.days.iter().map(|d| d.count_ones()).sum()
    }

    /// True when no part of any day is completed.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|&d| d == 0)
    }
}

impl Serialize for CompletedDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for day in 1..=EVENT_DAYS {
            let parts = self.parts(day);
            if !parts.is_empty() {
                map.serialize_entry(&day.to_string(), &parts)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CompletedDays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Vec<u8>>::deserialize(deserializer)?;
        let mut completed = CompletedDays::default();
        for (day_str, parts) in raw {
            let day: u8 = day_str
                .parse()
                .map_err(|_| DeError::custom(format!("invalid day key {day_str:?}")))?;
            if !(1..=EVENT_DAYS).contains(&day) {
                return Err(DeError::custom(format!("day {day} out of range")));
            }
            for part in parts {
                if !(1..=2).contains(&part) {
                    return Err(DeError::custom(format!("part {part} out of range")));
                }
                completed.insert(day, part);
            }
        }
        Ok(completed)
    }
}

/// State of a single leaderboard member within one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberState {
    /// Member id, unique within the leaderboard
    pub id: String,
    /// Display name ("User <id>" when the member is anonymous)
    pub name: String,
    /// Local score
    pub score: i64,
    /// Star count reported by the API (informational)
    pub stars: u32,
    /// Competition rank, recomputed for every snapshot
    #[serde(default)]
    pub rank: u32,
    /// Completed (day, part) pairs
    #[serde(default)]
    pub completed_days: CompletedDays,
}

/// One observation of a leaderboard's full member state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix timestamp of capture (seconds)
    pub observed_at: i64,
    /// Members keyed by id; BTreeMap iteration gives the deterministic
    /// alphabetical member order change detection relies on
    pub members: BTreeMap<String, MemberState>,
    /// (member id, score) sorted score-descending, id ascending on ties
    pub rankings: Vec<(String, i64)>,
}

impl Snapshot {
    /// Build a snapshot from processed member states, deriving `rankings`
    /// and assigning competition ranks.
    ///
    /// Competition ranking: tied scores share a rank, and each rank equals
    /// one plus the number of strictly greater scores, so ties skip the
    /// following rank values (scores `[100, 100, 80]` rank `[1, 1, 3]`).
    pub fn new(observed_at: i64, mut members: BTreeMap<String, MemberState>) -> Self {
        let mut rankings: Vec<(String, i64)> = members
            .values()
            .map(|m| (m.id.clone(), m.score))
            .collect();
        rankings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut prev_score: Option<i64> = None;
        let mut prev_rank = 0u32;
        for (position, (id, score)) in rankings.iter().enumerate() {
            let rank = match prev_score {
                Some(prev) if prev == *score => prev_rank,
                _ => position as u32 + 1,
            };
            prev_score = Some(*score);
            prev_rank = rank;
            if let Some(member) = members.get_mut(id) {
                member.rank = rank;
            }
        }

        Self {
            observed_at,
            members,
            rankings,
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rendering change events and rankings into Telegram messages.
//!
//! Messages use Telegram's HTML parse mode, so member names are escaped.
//! Anything longer than the 4096-character message limit is split on line
//! boundaries.

use crate::models::{ChangeEvent, Snapshot};

/// Telegram message character limit.
pub const MESSAGE_LIMIT: usize = 4096;

/// Format an ordered event list into one or more messages.
///
/// The detector already ordered the events (stars, ranks, scores, members)
/// and suppressed score changes for star earners, so this only groups and
/// renders.
pub fn format_changes(events: &[ChangeEvent]) -> Vec<String> {
    if events.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["\u{1F4CA} Leaderboard Update".to_string(), String::new()];

    push_section(&mut lines, events, "\u{2B50} New Stars:", |e| match e {
        ChangeEvent::NewStar {
            member_name,
            day,
            part,
            completes_day,
            ..
        } => Some(format_new_star(member_name, *day, *part, *completes_day)),
        _ => None,
    });

    push_section(&mut lines, events, "\u{1F4C8} Rank Changes:", |e| match e {
        ChangeEvent::RankChange {
            member_name,
            old_rank,
            new_rank,
            ..
        } => Some(format_rank_change(member_name, *old_rank, *new_rank)),
        _ => None,
    });

    push_section(&mut lines, events, "\u{1F4B0} Score Changes:", |e| match e {
        ChangeEvent::ScoreChange {
            member_name,
            old_score,
            new_score,
            ..
        } => Some(format_score_change(member_name, *old_score, *new_score)),
        _ => None,
    });

    push_section(&mut lines, events, "\u{1F465} New Members:", |e| match e {
        ChangeEvent::NewMember { member_name, .. } => {
            Some(format!("  \u{2022} {}", escape_html(member_name)))
        }
        _ => None,
    });

    split_long_message(lines.join("\n").trim_end().to_string())
}

/// Format the current rankings of a snapshot.
///
/// Only members with at least one star are listed, score-descending with
/// competition ranks (ties share a rank).
pub fn format_leaderboard(snapshot: &Snapshot, year: i32) -> Vec<String> {
    let mut lines = vec![
        format!("\u{1F3C6} Leaderboard Rankings ({year})"),
        String::new(),
    ];

    if snapshot.members.is_empty() {
        lines.push("No members on this leaderboard yet.".to_string());
        return vec![lines.join("\n").trim_end().to_string()];
    }

    let mut ranked: Vec<_> = snapshot
        .members
        .values()
        .filter(|m| m.stars >= 1)
        .collect();

    if ranked.is_empty() {
        lines.push("No members have earned any stars yet.".to_string());
        return vec![lines.join("\n").trim_end().to_string()];
    }

    ranked.sort_by(|a, b| (b.score, b.stars).cmp(&(a.score, a.stars)));

    for (position, member) in ranked.iter().enumerate() {
        let rank = 1 + ranked[..position]
            .iter()
            .filter(|other| other.score > member.score)
            .count();
        lines.push(format!(
            "{}. {}: {} points ({}\u{2B50})",
            rank,
            escape_html(&member.name),
            member.score,
            member.stars
        ));
    }

    split_long_message(lines.join("\n").trim_end().to_string())
}

/// Render a section header plus the matching events, if any.
fn push_section(
    lines: &mut Vec<String>,
    events: &[ChangeEvent],
    header: &str,
    render: impl Fn(&ChangeEvent) -> Option<String>,
) {
    let rendered: Vec<String> = events.iter().filter_map(render).collect();
    if rendered.is_empty() {
        return;
    }
    lines.push(header.to_string());
    lines.extend(rendered);
    lines.push(String::new());
}

fn format_new_star(name: &str, day: u8, part: u8, completes_day: bool) -> String {
    let name = escape_html(name);
    if completes_day && part == 2 {
        format!("  \u{1F31F} {name} - Day {day} (Complete!)")
    } else {
        format!("  \u{2B50} {name} - Day {day} Part {part}")
    }
}

fn format_rank_change(name: &str, old_rank: u32, new_rank: u32) -> String {
    let arrow = if new_rank < old_rank {
        format!("\u{2191} {}", old_rank - new_rank)
    } else {
        format!("\u{2193} {}", new_rank - old_rank)
    };
    format!(
        "  {}: #{} \u{2192} #{} ({})",
        escape_html(name),
        old_rank,
        new_rank,
        arrow
    )
}

fn format_score_change(name: &str, old_score: i64, new_score: i64) -> String {
    let delta = new_score - old_score;
    let sign = if delta > 0 { "+" } else { "" };
    format!(
        "  {}: {} \u{2192} {} ({sign}{delta})",
        escape_html(name),
        old_score,
        new_score
    )
}

/// Escape the characters Telegram's HTML parse mode treats specially.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split a message on line boundaries so each part fits the limit.
fn split_long_message(message: String) -> Vec<String> {
    if message.len() <= MESSAGE_LIMIT {
        return vec![message];
    }

    let mut messages = Vec::new();
    let mut current = String::new();

    for line in message.split('\n') {
        if current.len() + line.len() + 1 <= MESSAGE_LIMIT {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        } else {
            if !current.is_empty() {
                messages.push(current);
            }
            current = line.to_string();
        }
    }

    if !current.is_empty() {
        messages.push(current);
    }

    messages
}

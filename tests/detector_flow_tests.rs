// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end diffing from raw API JSON: parse, process into snapshots, then
//! detect changes across polls.

use aoc_tracker::models::ChangeEvent;
use aoc_tracker::services::aoc::RawLeaderboard;
use aoc_tracker::services::detector::detect;

fn parse(json: &str) -> RawLeaderboard {
    serde_json::from_str(json).expect("parse raw leaderboard")
}

#[test]
fn test_two_member_board_first_poll_then_new_member() {
    let first = parse(
        r#"{
            "members": {
                "111": {"name": "Alice", "stars": 2, "local_score": 20,
                        "completion_day_level": {"1": {"1": {}, "2": {}}}},
                "222": {"name": "Bob", "stars": 1, "local_score": 8,
                        "completion_day_level": {"1": {"1": {}}}}
            }
        }"#,
    )
    .into_snapshot(1_000);

    // The first observation only establishes the baseline.
    assert!(detect(None, &first).is_empty());

    let second = parse(
        r#"{
            "members": {
                "111": {"name": "Alice", "stars": 2, "local_score": 20,
                        "completion_day_level": {"1": {"1": {}, "2": {}}}},
                "222": {"name": "Bob", "stars": 1, "local_score": 8,
                        "completion_day_level": {"1": {"1": {}}}},
                "333": {"name": "Carol", "stars": 0, "local_score": 0,
                        "completion_day_level": {}}
            }
        }"#,
    )
    .into_snapshot(2_000);

    let events = detect(Some(&first), &second);
    assert_eq!(
        events,
        vec![ChangeEvent::NewMember {
            member_id: "333".to_string(),
            member_name: "Carol".to_string(),
        }]
    );
}

#[test]
fn test_star_with_score_and_rank_movement() {
    let first = parse(
        r#"{
            "members": {
                "111": {"name": "Alice", "stars": 1, "local_score": 10,
                        "completion_day_level": {"1": {"1": {}}}},
                "222": {"name": "Bob", "stars": 1, "local_score": 12,
                        "completion_day_level": {"1": {"1": {}}}}
            }
        }"#,
    )
    .into_snapshot(1_000);

    let second = parse(
        r#"{
            "members": {
                "111": {"name": "Alice", "stars": 2, "local_score": 14,
                        "completion_day_level": {"1": {"1": {}, "2": {}}}},
                "222": {"name": "Bob", "stars": 1, "local_score": 12,
                        "completion_day_level": {"1": {"1": {}}}}
            }
        }"#,
    )
    .into_snapshot(2_000);

    let events = detect(Some(&first), &second);

    // Alice: new star (completes day 1), rank 2 -> 1; her score change is
    // suppressed by the star. Bob: rank 1 -> 2, score unchanged.
    assert_eq!(
        events,
        vec![
            ChangeEvent::NewStar {
                member_id: "111".to_string(),
                member_name: "Alice".to_string(),
                day: 1,
                part: 2,
                completes_day: true,
            },
            ChangeEvent::RankChange {
                member_id: "111".to_string(),
                member_name: "Alice".to_string(),
                old_rank: 2,
                new_rank: 1,
            },
            ChangeEvent::RankChange {
                member_id: "222".to_string(),
                member_name: "Bob".to_string(),
                old_rank: 1,
                new_rank: 2,
            },
        ]
    );
}

#[test]
fn test_anonymous_members_get_placeholder_names() {
    let snap = parse(
        r#"{
            "members": {
                "444": {"name": null, "stars": 0, "local_score": 0,
                        "completion_day_level": {}}
            }
        }"#,
    )
    .into_snapshot(1_000);

    assert_eq!(snap.members["444"].name, "User 444");
}

#[test]
fn test_empty_board_parses() {
    let snap = parse(r#"{"members": {}}"#).into_snapshot(1_000);
    assert!(snap.members.is_empty());
    assert!(snap.rankings.is_empty());
    assert!(detect(None, &snap).is_empty());
}

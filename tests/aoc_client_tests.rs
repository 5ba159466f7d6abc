// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP status mapping of the AoC client against a mock server.

use aoc_tracker::services::aoc::{AocApiError, AocClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOARD_JSON: &str = r#"{
    "members": {
        "111": {"name": "Alice", "stars": 1, "local_score": 5,
                "completion_day_level": {"1": {"1": {}}}}
    }
}"#;

async fn mock_server_with(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/leaderboard/private/view/99.json"))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_successful_fetch_parses_members() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/leaderboard/private/view/99.json"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(BOARD_JSON, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AocClient::with_base_url(server.uri());
    let raw = client
        .fetch_leaderboard("session=abc", "99", 2025)
        .await
        .expect("fetch");

    assert_eq!(raw.members.len(), 1);
    assert_eq!(raw.members["111"].name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_unauthorized_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/leaderboard/private/view/99.json"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = AocClient::with_base_url(server.uri());
    let err = client
        .fetch_leaderboard("session=bad", "99", 2025)
        .await
        .expect_err("401 must fail");

    assert!(matches!(err, AocApiError::Unauthorized));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_not_found_names_the_board() {
    let server = mock_server_with(404, "").await;

    let client = AocClient::with_base_url(server.uri());
    let err = client
        .fetch_leaderboard("session=abc", "99", 2025)
        .await
        .expect_err("404 must fail");

    assert!(matches!(err, AocApiError::NotFound(ref id) if id == "99"));
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let server = mock_server_with(200, "<html>log in first</html>").await;

    let client = AocClient::with_base_url(server.uri());
    let err = client
        .fetch_leaderboard("session=abc", "99", 2025)
        .await
        .expect_err("non-JSON body must fail");

    assert!(matches!(err, AocApiError::Malformed(_)));
}

#[tokio::test]
async fn test_server_errors_retry_then_surface() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/leaderboard/private/view/99.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = AocClient::with_base_url(server.uri());
    let err = client
        .fetch_leaderboard("session=abc", "99", 2025)
        .await
        .expect_err("persistent 503 must fail");

    assert!(matches!(err, AocApiError::Server(503)));
}

#[tokio::test]
async fn test_rate_limit_backs_off_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/leaderboard/private/view/99.json"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2025/leaderboard/private/view/99.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(BOARD_JSON, "application/json"))
        .mount(&server)
        .await;

    let client = AocClient::with_base_url(server.uri());
    let raw = client
        .fetch_leaderboard("session=abc", "99", 2025)
        .await
        .expect("retry after 429 should succeed");

    assert_eq!(raw.members.len(), 1);
}

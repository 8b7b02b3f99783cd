//! Integration tests for the HTTP API.
//!
//! Drives the axum router in-process against the in-memory repository.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sd_server::api::{AppState, create_router};
use sd_server::config::TournamentSettings;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use swiss_draft::TournamentManager;
use swiss_draft::db::MemoryRepository;
use tower::ServiceExt; // For `oneshot` method

const TOKEN: &str = "test-operator-token-0123";

/// Helper to create a test server on a fresh in-memory tournament
async fn create_test_server() -> Router {
    let repository = Arc::new(MemoryRepository::new());
    let manager = TournamentManager::open(repository, 1, "Test Open")
        .await
        .expect("Failed to open tournament");

    let state = AppState::new(Arc::new(manager), TOKEN, TournamentSettings::default());
    create_router(state)
}

enum Caller {
    Anonymous,
    Operator,
    Player(i64),
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Caller,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match caller {
        Caller::Anonymous => builder,
        Caller::Operator => builder.header("x-operator-token", TOKEN),
        Caller::Player(id) => builder.header("x-player-id", id.to_string()),
    };

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Enroll `names` and return name -> id
async fn enroll(app: &Router, names: &[&str]) -> HashMap<String, i64> {
    let mut ids = HashMap::new();
    for name in names {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/admin/players",
            Caller::Operator,
            Some(json!({ "name": name, "pronouns": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.insert(name.to_string(), body["id"].as_i64().unwrap());
    }
    ids
}

async fn schedule(app: &Router, players: &HashMap<String, i64>, rounds: u32) -> i64 {
    let ids: Vec<i64> = players.values().copied().collect();
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/admin/drafts",
        Caller::Operator,
        Some(json!({ "cube": "Test Cube", "phase": 1, "players": ids, "rounds": rounds, "pairing_seed": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["draft_id"].as_i64().unwrap()
}

async fn operator_post(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "POST", uri, Caller::Operator, None).await
}

// ============================================================================
// Health and access control
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_server().await;

    let (status, body) = send(&app, "GET", "/health", Caller::Anonymous, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    assert_eq!(body["active_drafts"], 0);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_server().await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn test_operator_routes_require_token() {
    let app = create_test_server().await;
    let body = json!({ "name": "Ana" });

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/players",
        Caller::Anonymous,
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/admin/players")
        .header("x-operator-token", "not-the-token-at-all")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_player_routes_require_known_player() {
    let app = create_test_server().await;

    let (status, _) = send(&app, "GET", "/api/v1/me/match", Caller::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/me/match", Caller::Player(999), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_draft_is_not_found() {
    let app = create_test_server().await;

    let (status, body) = send(&app, "GET", "/api/v1/drafts/42", Caller::Anonymous, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("draft 42"));
}

// ============================================================================
// Status views before play
// ============================================================================

#[tokio::test]
async fn test_not_yet_views() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben", "Cy", "Dee"]).await;
    let draft = schedule(&app, &players, 3).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/drafts/{draft}/seatings"),
        Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Draft has not been seated yet.");

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/drafts/{draft}/standings"),
        Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(body["error"], "No draft standings yet");

    let (_, body) = send(&app, "GET", "/api/v1/standings", Caller::Anonymous, None).await;
    assert_eq!(body["error"], "No event standings yet");

    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/seat")).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;

    let (_, body) = send(
        &app,
        "GET",
        "/api/v1/me/match",
        Caller::Player(players["Ana"]),
        None,
    )
    .await;
    assert_eq!(body["error"], "No checkin.");
}

#[tokio::test]
async fn test_timetable_lists_scheduled_draft() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben"]).await;
    schedule(&app, &players, 3).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/me/timetable",
        Caller::Player(players["Ben"]),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rendered = body.to_string();
    assert!(rendered.contains("Test Cube"));
}

// ============================================================================
// Round flow
// ============================================================================

#[tokio::test]
async fn test_full_round_over_http() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben", "Cy", "Dee"]).await;
    let draft = schedule(&app, &players, 3).await;

    let (status, body) = operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/seat")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["event"], "seated");
    assert_eq!(body["draft"]["seated"], true);

    for id in players.values() {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/drafts/{draft}/checkin"),
            Caller::Player(*id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["event"], "paired");
    assert_eq!(body["draft"]["draft_round"], 1);
    assert_eq!(body["draft"]["event_round"], 1);

    let (_, round) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/drafts/{draft}/round"),
        Caller::Operator,
        None,
    )
    .await;
    let matches = round["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m["result"] == "Pending"));

    let first = &matches[0];
    let match_id = first["id"].as_u64().unwrap();
    let p1 = players[first["player1"].as_str().unwrap()];
    let p2 = players[first["player2"].as_str().unwrap()];
    let other_id = matches[1]["id"].as_u64().unwrap();

    let report_uri = format!("/api/v1/drafts/{draft}/matches/{match_id}/report");
    let confirm_uri = format!("/api/v1/drafts/{draft}/matches/{match_id}/confirm");

    // Illegal score
    let (status, _) = send(
        &app,
        "POST",
        &report_uri,
        Caller::Player(p1),
        Some(json!({ "player1_wins": 3, "player2_wins": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        "POST",
        &report_uri,
        Caller::Player(p1),
        Some(json!({ "player1_wins": 2, "player2_wins": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["event"], "result_reported");

    let (_, view) = send(&app, "GET", "/api/v1/me/match", Caller::Player(p2), None).await;
    assert_eq!(view["result"], "1-2 (awaiting confirmation)");
    assert_eq!(view["result_confirmed"], false);

    // Reporter cannot confirm
    let (status, _) = send(&app, "POST", &confirm_uri, Caller::Player(p1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &confirm_uri, Caller::Player(p2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["event"], "result_confirmed");

    // Second match still pending
    let (status, body) =
        operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/finish-round")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["recoverable"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/admin/drafts/{draft}/matches/{other_id}/override"),
        Caller::Operator,
        Some(json!({ "player1_wins": 1, "player2_wins": 1, "draws": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["event"], "result_overridden");

    let (status, body) =
        operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/finish-round")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["round"], 1);

    let (_, standings) = send(
        &app,
        "GET",
        &format!("/api/v1/drafts/{draft}/standings"),
        Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(standings["current_round"], 1);
    let lines = standings["standings"].as_array().unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["score"], 3);

    let (_, history) = send(&app, "GET", "/api/v1/me/history", Caller::Player(p1), None).await;
    assert!(history.to_string().contains("win"));
}

#[tokio::test]
async fn test_operator_confirm() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben"]).await;
    let draft = schedule(&app, &players, 1).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/seat")).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;

    let (_, round) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/drafts/{draft}/round"),
        Caller::Operator,
        None,
    )
    .await;
    let m = &round["matches"][0];
    let match_id = m["id"].as_u64().unwrap();
    let p2 = players[m["player2"].as_str().unwrap()];

    let confirm_uri = format!("/api/v1/admin/drafts/{draft}/matches/{match_id}/confirm");
    let (status, _) = operator_post(&app, &confirm_uri).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        "POST",
        &format!("/api/v1/drafts/{draft}/matches/{match_id}/report"),
        Caller::Player(p2),
        Some(json!({ "player1_wins": 0, "player2_wins": 2 })),
    )
    .await;

    let (status, _) = operator_post(&app, &confirm_uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/finish-round")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["round_finished"], true);

    let (status, body) = operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/finish")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["finished"], true);
}

#[tokio::test]
async fn test_pairing_conflict_is_recoverable() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben"]).await;
    let draft = schedule(&app, &players, 2).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/seat")).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;

    let (_, round) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/drafts/{draft}/round"),
        Caller::Operator,
        None,
    )
    .await;
    let match_id = round["matches"][0]["id"].as_u64().unwrap();
    send(
        &app,
        "POST",
        &format!("/api/v1/admin/drafts/{draft}/matches/{match_id}/override"),
        Caller::Operator,
        Some(json!({ "player1_wins": 2, "player2_wins": 0 })),
    )
    .await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/finish-round")).await;

    // The only possible pair already played
    let (status, body) = operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["recoverable"], true);

    let (_, status_body) = send(
        &app,
        "GET",
        &format!("/api/v1/drafts/{draft}"),
        Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(status_body["draft_round"], 1);
}

#[tokio::test]
async fn test_pairings_hide_own_match() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben", "Cy", "Dee", "Eve"]).await;
    let draft = schedule(&app, &players, 3).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/seat")).await;

    let ana = players["Ana"];
    send(
        &app,
        "POST",
        &format!("/api/v1/drafts/{draft}/checkin"),
        Caller::Player(ana),
        None,
    )
    .await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/drafts/{draft}/pairings"),
        Caller::Player(ana),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let others = body["other_pairings"].as_array().unwrap();
    assert!(others.iter().all(|p| p["player1"] != "Ana" && p["player2"] != "Ana"));
    // Two tables and a bye among five players; Ana sits at most one of them
    let shown = others.len() + usize::from(!body["bye"].is_null());
    assert_eq!(shown, 2);
}

#[tokio::test]
async fn test_reset_draft() {
    let app = create_test_server().await;
    let players = enroll(&app, &["Ana", "Ben", "Cy", "Dee"]).await;
    let draft = schedule(&app, &players, 3).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/seat")).await;
    operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/pair")).await;

    let (status, body) = operator_post(&app, &format!("/api/v1/admin/drafts/{draft}/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["event"], "reset");
    assert_eq!(body["draft"]["seated"], false);
    assert_eq!(body["draft"]["event_round"], 0);
}

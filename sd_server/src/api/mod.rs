//! HTTP API for the tournament server.
//!
//! # Modules
//!
//! - [`drafts`]: draft status, standings, seatings, pairings and the operator round flow
//! - [`matches`]: result reporting, confirmation and overrides
//! - [`players`]: enrollment, check-in/out and player-scoped views
//! - [`middleware`]: operator token and player identification
//! - [`error`]: engine error to HTTP status mapping
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health
//!
//! GET  /api/v1/drafts
//! GET  /api/v1/drafts/{draft_id}
//! GET  /api/v1/drafts/{draft_id}/standings
//! GET  /api/v1/drafts/{draft_id}/seatings
//! GET  /api/v1/drafts/{draft_id}/pairings          x-player-id optional
//! GET  /api/v1/standings
//!
//! GET  /api/v1/me/match                             x-player-id
//! GET  /api/v1/me/timetable                         x-player-id
//! GET  /api/v1/me/history                           x-player-id
//! POST /api/v1/drafts/{draft_id}/checkin            x-player-id
//! POST /api/v1/drafts/{draft_id}/checkout           x-player-id
//! POST /api/v1/drafts/{draft_id}/matches/{match_id}/report    x-player-id
//! POST /api/v1/drafts/{draft_id}/matches/{match_id}/confirm   x-player-id
//!
//! POST /api/v1/admin/players                        x-operator-token
//! POST /api/v1/admin/drafts                         x-operator-token
//! GET  /api/v1/admin/drafts/{draft_id}/round        x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/seat         x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/pair         x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/finish-round x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/finish       x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/reset        x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/matches/{match_id}/confirm   x-operator-token
//! POST /api/v1/admin/drafts/{draft_id}/matches/{match_id}/override  x-operator-token
//! ```
//!
//! # CORS
//!
//! CORS is permissive so dashboards on other origins can poll the read routes.

pub mod drafts;
pub mod error;
pub mod matches;
pub mod middleware;
pub mod players;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use swiss_draft::{StatusService, TournamentManager, db::Database};
use tower_http::cors::CorsLayer;

use crate::config::TournamentSettings;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    pub status: StatusService,
    pub operator_token: Arc<str>,
    pub settings: Arc<TournamentSettings>,
    /// Present when running against PostgreSQL
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(
        manager: Arc<TournamentManager>,
        operator_token: impl Into<Arc<str>>,
        settings: TournamentSettings,
    ) -> Self {
        Self {
            status: StatusService::new(manager.clone()),
            manager,
            operator_token: operator_token.into(),
            settings: Arc::new(settings),
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use sd_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    // Read-only routes polled by dashboards
    let public_routes = Router::new()
        .route("/drafts", get(drafts::list_drafts))
        .route("/drafts/{draft_id}", get(drafts::get_draft))
        .route("/drafts/{draft_id}/standings", get(drafts::draft_standings))
        .route("/drafts/{draft_id}/seatings", get(drafts::seatings))
        .route("/drafts/{draft_id}/pairings", get(drafts::pairings))
        .route("/standings", get(drafts::event_standings));

    let player_routes = Router::new()
        .route("/me/match", get(players::my_match))
        .route("/me/timetable", get(players::my_timetable))
        .route("/me/history", get(players::my_history))
        .route("/drafts/{draft_id}/checkin", post(players::check_in))
        .route("/drafts/{draft_id}/checkout", post(players::check_out))
        .route(
            "/drafts/{draft_id}/matches/{match_id}/report",
            post(matches::report_result),
        )
        .route(
            "/drafts/{draft_id}/matches/{match_id}/confirm",
            post(matches::confirm_result),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::player_middleware,
        ));

    let operator_routes = Router::new()
        .route("/admin/players", post(players::enroll_player))
        .route("/admin/drafts", post(drafts::schedule_draft))
        .route("/admin/drafts/{draft_id}/round", get(drafts::admin_round))
        .route("/admin/drafts/{draft_id}/seat", post(drafts::seat_draft))
        .route("/admin/drafts/{draft_id}/pair", post(drafts::pair_round))
        .route(
            "/admin/drafts/{draft_id}/finish-round",
            post(drafts::finish_round),
        )
        .route("/admin/drafts/{draft_id}/finish", post(drafts::finish_draft))
        .route("/admin/drafts/{draft_id}/reset", post(drafts::reset_draft))
        .route(
            "/admin/drafts/{draft_id}/matches/{match_id}/confirm",
            post(matches::operator_confirm),
        )
        .route(
            "/admin/drafts/{draft_id}/matches/{match_id}/override",
            post(matches::override_result),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::operator_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(player_routes)
        .merge(operator_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database (if any) answers, `503` otherwise.
///
/// ```bash
/// curl http://localhost:8000/health
/// # {"status":"healthy","database":true,"active_drafts":2,"event_round":4,...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match &state.database {
        Some(db) => db.health_check().await.is_ok(),
        None => true,
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "active_drafts": state.manager.active_draft_count().await,
        "event_round": state.manager.event_round().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

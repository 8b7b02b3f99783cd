//! Draft API handlers.
//!
//! Read routes project committed draft snapshots for dashboards. Operator
//! routes drive the round flow: seat, pair, finish round, finish, reset.
//!
//! # Examples
//!
//! Pair the next round:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/admin/drafts/1/pair \
//!   -H "x-operator-token: $OPERATOR_TOKEN"
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use swiss_draft::{
    draft::{DraftEvent, DraftOutcome},
    status::{AdminRoundStatus, DraftStatus, PairingsResponse, SeatingsResponse, StandingsResponse, views},
    tournament::{DraftConfig, DraftId, PlayerId},
};

use super::AppState;
use super::error::ApiResult;
use super::middleware::player_id_from_headers;
use super::request_id::RequestId;
use crate::{logging, metrics};

/// Body returned by every draft mutation
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub event: DraftEvent,
    pub draft: DraftStatus,
}

pub(super) async fn respond(state: &AppState, outcome: DraftOutcome) -> Json<MutationResponse> {
    let event_round = state.manager.event_round().await;
    Json(MutationResponse {
        draft: views::draft_status(&outcome.draft, event_round),
        event: outcome.event,
    })
}

#[derive(Debug, Deserialize)]
pub struct ScheduleDraftRequest {
    pub cube: String,
    pub phase: u32,
    pub players: Vec<PlayerId>,
    /// Falls back to the server's `ROUNDS_PER_DRAFT`
    pub rounds: Option<u32>,
    /// Falls back to the server's `PAIRING_SEED`
    pub pairing_seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ScheduledResponse {
    pub draft_id: DraftId,
}

/// List every draft in schedule order.
pub async fn list_drafts(State(state): State<AppState>) -> ApiResult<Json<Vec<DraftStatus>>> {
    Ok(Json(state.status.all_drafts().await?))
}

/// Draft status: `{cube, paired, finished, seated, in_progress, draft_round, event_round, players}`.
pub async fn get_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<DraftStatus>> {
    Ok(Json(state.status.draft_status(draft_id).await?))
}

pub async fn draft_standings(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<StandingsResponse>> {
    Ok(Json(state.status.draft_standings(draft_id).await?))
}

/// Standings across every draft of the tournament.
pub async fn event_standings(State(state): State<AppState>) -> ApiResult<Json<StandingsResponse>> {
    Ok(Json(state.status.event_standings().await?))
}

pub async fn seatings(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<SeatingsResponse>> {
    Ok(Json(state.status.seatings(draft_id).await?))
}

/// Current pairings; when `x-player-id` is sent the caller's own match is left out.
pub async fn pairings(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    headers: HeaderMap,
) -> ApiResult<Json<PairingsResponse>> {
    let viewer = player_id_from_headers(&headers);
    Ok(Json(state.status.pairings(draft_id, viewer).await?))
}

/// Operator view of every match in the current round.
pub async fn admin_round(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<AdminRoundStatus>> {
    Ok(Json(state.status.admin_round(draft_id).await?))
}

/// Schedule a draft.
///
/// # Request Body
///
/// ```json
/// { "cube": "Vintage Cube", "phase": 1, "players": [1, 2, 3, 4], "rounds": 3 }
/// ```
///
/// # Response
///
/// `201 Created` with `{"draft_id": 1}`.
pub async fn schedule_draft(
    State(state): State<AppState>,
    Json(request): Json<ScheduleDraftRequest>,
) -> ApiResult<(StatusCode, Json<ScheduledResponse>)> {
    let config = DraftConfig {
        cube: request.cube,
        phase: request.phase,
        rounds: request.rounds.unwrap_or(state.settings.rounds_per_draft),
        players: request.players,
        pairing_seed: request.pairing_seed.or(state.settings.pairing_seed),
    };
    let cube = config.cube.clone();

    let draft_id = state.manager.schedule_draft(config).await?;
    metrics::active_drafts(state.manager.active_draft_count().await);
    logging::log_operator_action(
        "schedule_draft",
        Some(draft_id),
        &format!("Scheduled {cube}"),
    );

    Ok((StatusCode::CREATED, Json(ScheduledResponse { draft_id })))
}

pub async fn seat_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state.manager.seat_draft(draft_id).await?;
    logging::log_operator_action(
        "seat_draft",
        Some(draft_id),
        &format!("Seated {} players", outcome.draft.seats().len()),
    );
    Ok(respond(&state, outcome).await)
}

/// Pair the next round.
///
/// # Errors
///
/// - `409 Conflict` with `recoverable: true` when no valid pairing exists
pub async fn pair_round(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    request_id: RequestId,
) -> ApiResult<Json<MutationResponse>> {
    let start = Instant::now();
    let result = state.manager.pair_round(draft_id).await;
    logging::log_performance(
        "pair_round",
        start.elapsed().as_millis() as u64,
        Some(request_id.as_str()),
    );

    let outcome = result?;
    metrics::rounds_paired_total();
    logging::log_operator_action(
        "pair_round",
        Some(draft_id),
        &format!("Paired round {}", outcome.draft.round()),
    );
    Ok(respond(&state, outcome).await)
}

/// Finish the current round.
///
/// # Errors
///
/// - `409 Conflict` with `recoverable: true` while results are unconfirmed
pub async fn finish_round(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state.manager.finish_round(draft_id).await?;
    logging::log_operator_action(
        "finish_round",
        Some(draft_id),
        &format!("Finished round {}", outcome.draft.round()),
    );
    Ok(respond(&state, outcome).await)
}

pub async fn finish_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state.manager.finish_draft(draft_id).await?;
    logging::log_operator_action("finish_draft", Some(draft_id), "Draft finished");
    Ok(respond(&state, outcome).await)
}

/// Return the draft to unseated, dropping every match.
pub async fn reset_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state.manager.reset_draft(draft_id).await?;
    logging::log_operator_action("reset_draft", Some(draft_id), "Draft reset");
    Ok(respond(&state, outcome).await)
}

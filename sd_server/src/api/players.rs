//! Player API handlers: enrollment, check-in/out and player-scoped views.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use swiss_draft::{
    status::{MatchHistory, PlayerMatchView, Timetable},
    tournament::{DraftId, Player, Pronouns},
};

use super::AppState;
use super::drafts::{MutationResponse, respond};
use super::error::ApiResult;
use super::middleware::PlayerIdentity;
use crate::logging;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub name: String,
    /// One of `x`, `m`, `f`, `n`
    #[serde(default)]
    pub pronouns: Pronouns,
}

/// Enroll a player in the tournament.
///
/// # Response
///
/// `201 Created` with the new player, including the id used in `x-player-id`.
pub async fn enroll_player(
    State(state): State<AppState>,
    Json(request): Json<EnrollRequest>,
) -> ApiResult<(StatusCode, Json<Player>)> {
    let player = state
        .manager
        .enroll_player(&request.name, request.pronouns)
        .await?;

    logging::log_operator_action(
        "enroll_player",
        None,
        &format!("Enrolled {} as {}", player.name, player.id),
    );
    Ok((StatusCode::CREATED, Json(player)))
}

/// The caller's match in their latest draft, or a `"No checkin."` /
/// `"No match yet."` style error object.
pub async fn my_match(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
) -> ApiResult<Json<PlayerMatchView>> {
    Ok(Json(state.status.player_match(player).await?))
}

pub async fn my_timetable(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
) -> ApiResult<Json<Timetable>> {
    Ok(Json(state.status.timetable(player).await?))
}

pub async fn my_history(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
) -> ApiResult<Json<MatchHistory>> {
    Ok(Json(state.status.match_history(player).await?))
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state.manager.check_in(draft_id, player).await?;
    tracing::info!(draft_id, player, "Player checked in");
    Ok(respond(&state, outcome).await)
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
    Path(draft_id): Path<DraftId>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state.manager.check_out(draft_id, player).await?;
    tracing::info!(draft_id, player, "Player checked out");
    Ok(respond(&state, outcome).await)
}

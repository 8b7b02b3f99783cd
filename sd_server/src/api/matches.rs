//! Match result API handlers.
//!
//! Players report and confirm; operators confirm on a player's behalf or
//! override a disputed result.
//!
//! # Examples
//!
//! Report a 2-1 win:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/drafts/1/matches/3/report \
//!   -H "x-player-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"player1_wins": 2, "player2_wins": 1}'
//! ```
//!
//! Scores are always given from player 1's side of the match.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use swiss_draft::{
    draft::{Actor, GameScore, MatchId},
    tournament::DraftId,
};

use super::AppState;
use super::drafts::{MutationResponse, respond};
use super::error::ApiResult;
use super::middleware::PlayerIdentity;
use crate::{logging, metrics};

/// Report a result for the caller's match.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not in the match
/// - `409 Conflict`: match already has a result, or its round is not being played
/// - `422 Unprocessable Entity`: score is not a legal best-of-three result
pub async fn report_result(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
    Path((draft_id, match_id)): Path<(DraftId, MatchId)>,
    Json(score): Json<GameScore>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state
        .manager
        .report_result(draft_id, match_id, player, score)
        .await?;

    metrics::results_reported_total("report");
    logging::log_result_event("report", draft_id, match_id, Some(player));
    Ok(respond(&state, outcome).await)
}

/// Confirm the opponent's report.
///
/// # Errors
///
/// - `403 Forbidden`: caller reported the result, or is not in the match
/// - `409 Conflict`: nothing is awaiting confirmation
pub async fn confirm_result(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
    Path((draft_id, match_id)): Path<(DraftId, MatchId)>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state
        .manager
        .confirm_result(draft_id, match_id, Actor::Player(player))
        .await?;

    metrics::results_reported_total("confirm");
    logging::log_result_event("confirm", draft_id, match_id, Some(player));
    Ok(respond(&state, outcome).await)
}

/// Confirm a reported result as the operator.
pub async fn operator_confirm(
    State(state): State<AppState>,
    Path((draft_id, match_id)): Path<(DraftId, MatchId)>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state
        .manager
        .confirm_result(draft_id, match_id, Actor::Operator)
        .await?;

    metrics::results_reported_total("confirm");
    logging::log_result_event("confirm", draft_id, match_id, None);
    Ok(respond(&state, outcome).await)
}

/// Set and confirm a result regardless of its current state.
pub async fn override_result(
    State(state): State<AppState>,
    Path((draft_id, match_id)): Path<(DraftId, MatchId)>,
    Json(score): Json<GameScore>,
) -> ApiResult<Json<MutationResponse>> {
    let outcome = state
        .manager
        .override_result(draft_id, match_id, score)
        .await?;

    metrics::results_reported_total("override");
    logging::log_operator_action(
        "override_result",
        Some(draft_id),
        &format!("Match {match_id} set to {score}"),
    );
    Ok(respond(&state, outcome).await)
}

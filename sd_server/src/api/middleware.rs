//! Caller identification middleware.
//!
//! Operator routes require the shared `x-operator-token`; player routes
//! require `x-player-id` naming an enrolled player. Identity proof beyond
//! that belongs to whatever fronts this server.
//!
//! # Extracting the player
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use sd_server::api::middleware::PlayerIdentity;
//!
//! async fn handler(Extension(PlayerIdentity(player)): Extension<PlayerIdentity>) -> String {
//!     format!("Player {}", player)
//! }
//! # let _ = handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use swiss_draft::tournament::PlayerId;

use super::AppState;

/// Header carrying the operator token
pub const OPERATOR_TOKEN_HEADER: &str = "x-operator-token";

/// Header naming the calling player
pub const PLAYER_ID_HEADER: &str = "x-player-id";

/// Player the request is made on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerIdentity(pub PlayerId);

/// Parse the `x-player-id` header, if present and numeric
pub fn player_id_from_headers(headers: &HeaderMap) -> Option<PlayerId> {
    headers
        .get(PLAYER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Reject requests without the operator token
///
/// - **Missing header**: `401 Unauthorized`
/// - **Wrong token**: `403 Forbidden`
pub async fn operator_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(OPERATOR_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !token_matches(presented, &state.operator_token) {
        tracing::warn!(uri = %request.uri(), "Rejected operator request with a bad token");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

/// Resolve `x-player-id` and inject [`PlayerIdentity`]
///
/// - **Missing or malformed header**: `401 Unauthorized`
/// - **Unknown player**: `403 Forbidden`
pub async fn player_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let player = player_id_from_headers(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    if state.manager.player(player).await.is_none() {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(PlayerIdentity(player));
    Ok(next.run(request).await)
}

//! Mapping of engine errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use swiss_draft::DraftError;

use crate::metrics;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Set when an operator is expected to step in
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recoverable: bool,
}

/// Handler error wrapping a [`DraftError`]
#[derive(Debug)]
pub struct ApiError(pub DraftError);

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DraftError::NotFound(_) => StatusCode::NOT_FOUND,
            DraftError::InvalidTransition { .. }
            | DraftError::AlreadyReported(_)
            | DraftError::NotReported(_)
            | DraftError::PairingConflict(_)
            | DraftError::IncompleteRound { .. } => StatusCode::CONFLICT,
            DraftError::NotAParticipant { .. } | DraftError::SelfConfirmation => {
                StatusCode::FORBIDDEN
            }
            DraftError::InvalidScore(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DraftError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DraftError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            DraftError::PairingConflict(conflict) => {
                metrics::pairing_conflicts_total();
                tracing::warn!("Pairing conflict: {}", conflict);
            }
            DraftError::Storage(e) => tracing::error!("Storage failure: {}", e),
            DraftError::Unavailable(id) => tracing::error!("Draft {} actor is gone", id),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.0.client_message(),
            recoverable: self.0.is_operator_recoverable(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

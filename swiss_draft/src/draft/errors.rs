//! Draft error types.

use thiserror::Error;

use super::matches::MatchId;
use crate::db::StorageError;
use crate::pairing::PairingConflict;
use crate::tournament::models::{DraftId, PlayerId};

/// Entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Tournament,
    Draft(DraftId),
    Match(MatchId),
    Player(PlayerId),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Tournament => write!(f, "tournament"),
            Missing::Draft(id) => write!(f, "draft {id}"),
            Missing::Match(id) => write!(f, "match {id}"),
            Missing::Player(id) => write!(f, "player {id}"),
        }
    }
}

/// Draft and match errors
#[derive(Debug, Error)]
pub enum DraftError {
    /// State machine rule violated
    #[error("Cannot {action}: {reason}")]
    InvalidTransition { action: &'static str, reason: String },

    /// No pairing respects the no-rematch and bye rules
    #[error("Pairing conflict: {0}")]
    PairingConflict(#[from] PairingConflict),

    /// Caller is not one of the two players in the match
    #[error("Player {player} is not playing in match {match_id}")]
    NotAParticipant { player: PlayerId, match_id: MatchId },

    /// Reporter tried to confirm their own result
    #[error("A result cannot be confirmed by the player who reported it")]
    SelfConfirmation,

    /// Match already carries a result
    #[error("Match {0} already has a result")]
    AlreadyReported(MatchId),

    /// Match has no result awaiting confirmation
    #[error("Match {0} has no reported result awaiting confirmation")]
    NotReported(MatchId),

    /// Round still has unconfirmed matches
    #[error("Round {round} has {pending} unconfirmed match(es)")]
    IncompleteRound { round: u32, pending: usize },

    /// Score is not a legal best-of-three result
    #[error("Invalid game score: {0}")]
    InvalidScore(String),

    /// Unknown draft, match or player
    #[error("Not found: {0}")]
    NotFound(Missing),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Draft actor is no longer running
    #[error("Draft {0} is unavailable")]
    Unavailable(DraftId),
}

impl DraftError {
    pub(crate) fn invalid(action: &'static str, reason: impl Into<String>) -> Self {
        DraftError::InvalidTransition {
            action,
            reason: reason.into(),
        }
    }

    /// Errors an operator is expected to resolve by hand
    pub fn is_operator_recoverable(&self) -> bool {
        matches!(
            self,
            DraftError::PairingConflict(_) | DraftError::IncompleteRound { .. }
        )
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are sanitized so SQL details never reach callers.
    pub fn client_message(&self) -> String {
        match self {
            DraftError::Storage(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for draft operations
pub type DraftResult<T> = Result<T, DraftError>;

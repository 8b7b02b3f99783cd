//! Draft actor message types.

use serde::Serialize;
use tokio::sync::oneshot;

use super::errors::DraftResult;
use super::matches::{Actor, GameScore, MatchId};
use super::state_machine::Draft;
use crate::pairing::PairingPlan;
use crate::tournament::models::PlayerId;

/// Mutations a draft actor applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    /// Assign seats (operator)
    Seat,

    /// Pair the next round (operator)
    Pair,

    /// Close the current round (operator)
    FinishRound,

    /// Close the draft after its last round (operator)
    FinishDraft,

    /// Back to unseated, dropping every match (operator)
    Reset,

    /// Participant claims a result
    Report {
        match_id: MatchId,
        player: PlayerId,
        score: GameScore,
    },

    /// Opponent or operator accepts a claimed result
    Confirm { match_id: MatchId, actor: Actor },

    /// Operator sets a result directly
    Override { match_id: MatchId, score: GameScore },

    CheckIn { player: PlayerId },

    CheckOut { player: PlayerId },
}

impl DraftCommand {
    /// Short name for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            DraftCommand::Seat => "seat",
            DraftCommand::Pair => "pair",
            DraftCommand::FinishRound => "finish_round",
            DraftCommand::FinishDraft => "finish_draft",
            DraftCommand::Reset => "reset",
            DraftCommand::Report { .. } => "report",
            DraftCommand::Confirm { .. } => "confirm",
            DraftCommand::Override { .. } => "override",
            DraftCommand::CheckIn { .. } => "check_in",
            DraftCommand::CheckOut { .. } => "check_out",
        }
    }
}

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DraftEvent {
    Seated { players: usize },
    Paired { plan: PairingPlan },
    RoundFinished { round: u32 },
    DraftFinished,
    Reset,
    ResultReported { match_id: MatchId },
    ResultConfirmed { match_id: MatchId },
    ResultOverridden { match_id: MatchId },
    CheckedIn { player: PlayerId },
    CheckedOut { player: PlayerId },
}

/// Event plus the draft as committed
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub event: DraftEvent,
    pub draft: Draft,
}

/// Messages that can be sent to a DraftActor
#[derive(Debug)]
pub enum DraftMessage {
    /// Apply a command and persist the result
    Execute {
        command: DraftCommand,
        response: oneshot::Sender<DraftResult<DraftOutcome>>,
    },

    /// Current committed state
    Snapshot { response: oneshot::Sender<Draft> },

    /// Stop the actor
    Close,
}

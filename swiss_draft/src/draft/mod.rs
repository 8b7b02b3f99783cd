//! Draft aggregate, match result protocol and the per-draft actor.
//!
//! Each draft runs in its own Tokio task. Every mutation of that draft goes
//! through the actor's inbox, so two operators can never pair the same round
//! twice and a confirmation cannot race an override. Different drafts share
//! nothing and proceed in parallel.

pub mod actor;
pub mod errors;
pub mod matches;
pub mod messages;
pub mod state_machine;

pub use actor::{DraftActor, DraftHandle};
pub use errors::{DraftError, DraftResult, Missing};
pub use matches::{
    Actor, ConfirmedBy, GameScore, Match, MatchId, MatchResult, Outcome, ResultState,
};
pub use messages::{DraftCommand, DraftEvent, DraftMessage, DraftOutcome};
pub use state_machine::{Draft, DraftPhase, RoundStatus, Seat};

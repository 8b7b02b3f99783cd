//! Tournament module: a sequence of drafts sharing one player pool.
//!
//! The tournament owns the player registry and the draft schedule. Drafts are
//! grouped into phases; every draft of a phase must finish before a draft of
//! a later phase is seated. Draft round `k` of a phase-`p` draft with `r`
//! rounds is tournament round `(p - 1) * r + k`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swiss_draft::db::MemoryRepository;
//! use swiss_draft::tournament::{DraftConfig, Pronouns, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager =
//!         TournamentManager::open(Arc::new(MemoryRepository::new()), 1, "Cube Open").await?;
//!
//!     let mut players = Vec::new();
//!     for name in ["Alice", "Bo", "Cai", "Dee"] {
//!         players.push(manager.enroll_player(name, Pronouns::Unspecified).await?.id);
//!     }
//!
//!     let draft = manager.schedule_draft(DraftConfig::new("Vintage Cube", 1, players)).await?;
//!     manager.seat_draft(draft).await?;
//!     manager.pair_round(draft).await?;
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::TournamentManager;
pub use models::{
    DEFAULT_ROUNDS_PER_DRAFT, DraftConfig, DraftId, MAX_PHASE, MAX_ROUNDS_PER_DRAFT, Player,
    PlayerId, Pronouns, ScheduledDraft, TimetableEntry, Tournament, TournamentId,
    tournament_round_span,
};

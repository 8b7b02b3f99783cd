//! Status query service: read-only views over the tournament.
//!
//! Nothing here mutates state. Each call reads committed snapshots from the
//! draft actors and projects them, so it is cheap enough to poll.

pub mod views;

pub use views::{
    AdminMatchStatus, AdminRoundStatus, DraftStatus, HistoryEntry, HistoryOutcome, MatchHistory,
    NotYet, PairingLine, Pairings, PairingsResponse, PlayerBye, PlayerMatch, PlayerMatchView,
    SeatingLine, Seatings, SeatingsResponse, StandingsLine, StandingsResponse, StandingsTable,
    Timetable,
};

use std::sync::Arc;

use crate::draft::{DraftError, DraftResult, Missing};
use crate::tournament::TournamentManager;
use crate::tournament::models::{DraftId, PlayerId};

/// Read-only facade over a [`TournamentManager`]
#[derive(Clone)]
pub struct StatusService {
    manager: Arc<TournamentManager>,
}

impl StatusService {
    pub fn new(manager: Arc<TournamentManager>) -> Self {
        Self { manager }
    }

    async fn require_player(&self, player: PlayerId) -> DraftResult<()> {
        match self.manager.player(player).await {
            Some(_) => Ok(()),
            None => Err(DraftError::NotFound(Missing::Player(player))),
        }
    }

    pub async fn draft_status(&self, draft: DraftId) -> DraftResult<DraftStatus> {
        let snapshot = self.manager.draft_snapshot(draft).await?;
        Ok(views::draft_status(&snapshot, self.manager.event_round().await))
    }

    /// Summary of every draft in schedule order
    pub async fn all_drafts(&self) -> DraftResult<Vec<DraftStatus>> {
        let event_round = self.manager.event_round().await;
        Ok(self
            .manager
            .all_drafts()
            .await?
            .iter()
            .map(|d| views::draft_status(d, event_round))
            .collect())
    }

    pub async fn admin_round(&self, draft: DraftId) -> DraftResult<AdminRoundStatus> {
        let snapshot = self.manager.draft_snapshot(draft).await?;
        Ok(views::admin_round(&snapshot))
    }

    /// The player's match in the latest draft they are seated in
    pub async fn player_match(&self, player: PlayerId) -> DraftResult<PlayerMatchView> {
        self.require_player(player).await?;
        let draft = self.manager.current_draft_for(player).await?;
        Ok(views::player_match(draft.as_ref(), player))
    }

    pub async fn draft_standings(&self, draft: DraftId) -> DraftResult<StandingsResponse> {
        let snapshot = self.manager.draft_snapshot(draft).await?;
        Ok(views::draft_standings(&snapshot))
    }

    pub async fn event_standings(&self) -> DraftResult<StandingsResponse> {
        let drafts = self.manager.all_drafts().await?;
        let tournament = self.manager.tournament().await;
        Ok(views::event_standings(&tournament, &drafts))
    }

    pub async fn seatings(&self, draft: DraftId) -> DraftResult<SeatingsResponse> {
        let snapshot = self.manager.draft_snapshot(draft).await?;
        Ok(views::seatings(&snapshot))
    }

    /// Pairings of the current round, minus the viewer's own match
    pub async fn pairings(
        &self,
        draft: DraftId,
        viewer: Option<PlayerId>,
    ) -> DraftResult<PairingsResponse> {
        let snapshot = self.manager.draft_snapshot(draft).await?;
        Ok(views::pairings(&snapshot, viewer))
    }

    pub async fn timetable(&self, player: PlayerId) -> DraftResult<Timetable> {
        self.require_player(player).await?;
        let tournament = self.manager.tournament().await;
        Ok(views::timetable(&tournament, player))
    }

    pub async fn match_history(&self, player: PlayerId) -> DraftResult<MatchHistory> {
        self.require_player(player).await?;
        let drafts = self.manager.all_drafts().await?;
        let tournament = self.manager.tournament().await;
        Ok(views::match_history(&tournament, &drafts, player))
    }
}

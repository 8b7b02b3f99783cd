//! Tournament manager: the player registry, the draft schedule and one actor per draft.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::models::{
    DraftConfig, DraftId, Player, PlayerId, Pronouns, ScheduledDraft, Tournament, TournamentId,
};
use crate::db::DraftRepository;
use crate::draft::{
    Actor, Draft, DraftActor, DraftCommand, DraftError, DraftHandle, DraftOutcome, DraftResult,
    GameScore, MatchId, Missing,
};
use crate::pairing::PairingEngine;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    repository: Arc<dyn DraftRepository>,

    engine: PairingEngine,

    /// Players, schedule and event round
    tournament: Arc<RwLock<Tournament>>,

    /// Active draft handles
    drafts: Arc<RwLock<HashMap<DraftId, DraftHandle>>>,

    /// Set while the stored event round lags the in-memory one
    event_round_unsaved: Arc<AtomicBool>,
}

impl TournamentManager {
    /// Open tournament `id`, creating it as `name` when the repository has none
    pub async fn open(
        repository: Arc<dyn DraftRepository>,
        id: TournamentId,
        name: &str,
    ) -> DraftResult<Self> {
        Self::open_with_engine(repository, id, name, PairingEngine::new()).await
    }

    /// Like [`TournamentManager::open`] with a custom pairing engine
    pub async fn open_with_engine(
        repository: Arc<dyn DraftRepository>,
        id: TournamentId,
        name: &str,
        engine: PairingEngine,
    ) -> DraftResult<Self> {
        let tournament = match repository.load_tournament(id).await? {
            Some(tournament) => tournament,
            None => {
                let tournament = Tournament::new(id, name);
                repository.save_tournament(&tournament).await?;
                log::info!("Created tournament {} '{}'", id, name);
                tournament
            }
        };

        let manager = Self {
            repository,
            engine,
            tournament: Arc::new(RwLock::new(tournament)),
            drafts: Arc::new(RwLock::new(HashMap::new())),
            event_round_unsaved: Arc::new(AtomicBool::new(false)),
        };

        let loaded = manager.load_existing_drafts().await?;
        manager.refresh_event_round().await?;

        let tournament = manager.tournament.read().await;
        log::info!(
            "Tournament {} '{}' open: {} player(s), {} draft(s) loaded, event round {}",
            tournament.id,
            tournament.name,
            tournament.players.len(),
            loaded,
            tournament.event_round
        );
        drop(tournament);

        Ok(manager)
    }

    /// Spawn actors for every scheduled draft the repository holds
    async fn load_existing_drafts(&self) -> DraftResult<usize> {
        let tournament = self.tournament.read().await;
        let scheduled: Vec<DraftId> = tournament.schedule.iter().map(|d| d.id).collect();
        let stored = self.repository.load_drafts(tournament.id).await?;
        drop(tournament);

        let mut loaded = 0;
        for draft in stored {
            if !scheduled.contains(&draft.id) {
                log::warn!("Ignoring stored draft {} missing from the schedule", draft.id);
                continue;
            }
            self.spawn_actor(draft).await;
            loaded += 1;
        }

        Ok(loaded)
    }

    async fn spawn_actor(&self, draft: Draft) {
        let tournament_id = self.tournament.read().await.id;
        let draft_id = draft.id;
        let (actor, handle) =
            DraftActor::new(tournament_id, draft, self.engine, self.repository.clone());

        self.drafts.write().await.insert(draft_id, handle);

        tokio::spawn(async move {
            actor.run().await;
        });
    }

    async fn handle(&self, id: DraftId) -> DraftResult<DraftHandle> {
        self.drafts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DraftError::NotFound(Missing::Draft(id)))
    }

    async fn execute(&self, id: DraftId, command: DraftCommand) -> DraftResult<DraftOutcome> {
        self.handle(id).await?.execute(command).await
    }

    /// Copy of the tournament registry
    pub async fn tournament(&self) -> Tournament {
        self.tournament.read().await.clone()
    }

    pub async fn event_round(&self) -> u32 {
        self.tournament.read().await.event_round
    }

    pub async fn player(&self, id: PlayerId) -> Option<Player> {
        self.tournament.read().await.player(id).cloned()
    }

    /// Number of running draft actors
    pub async fn active_draft_count(&self) -> usize {
        self.drafts.read().await.len()
    }

    /// Enroll a player in the tournament
    pub async fn enroll_player(&self, name: &str, pronouns: Pronouns) -> DraftResult<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DraftError::invalid("enroll player", "name must not be empty"));
        }

        let mut tournament = self.tournament.write().await;
        let mut next = tournament.clone();
        let id = next.enroll(name, pronouns);
        self.repository.save_tournament(&next).await?;
        *tournament = next;

        log::info!("Enrolled player {} '{}'", id, name);
        tournament
            .player(id)
            .cloned()
            .ok_or(DraftError::NotFound(Missing::Player(id)))
    }

    /// Schedule a draft and start its actor
    pub async fn schedule_draft(&self, config: DraftConfig) -> DraftResult<DraftId> {
        config
            .validate()
            .map_err(|reason| DraftError::invalid("schedule draft", reason))?;

        let mut tournament = self.tournament.write().await;

        let mut roster = Vec::with_capacity(config.players.len());
        for &id in &config.players {
            let player = tournament
                .player(id)
                .cloned()
                .ok_or(DraftError::NotFound(Missing::Player(id)))?;
            if tournament.is_scheduled_in_phase(id, config.phase) {
                return Err(DraftError::invalid(
                    "schedule draft",
                    format!(
                        "player {} already plays a draft in phase {}",
                        id, config.phase
                    ),
                ));
            }
            roster.push(player);
        }

        let mut next = tournament.clone();
        let draft_id = next.allocate_draft_id();
        next.schedule.push(ScheduledDraft {
            id: draft_id,
            cube: config.cube.clone(),
            phase: config.phase,
            rounds: config.rounds,
            players: config.players.clone(),
        });

        let draft = Draft::new(draft_id, &config, roster);
        self.repository.save_draft(next.id, &draft).await?;
        self.repository.save_tournament(&next).await?;
        *tournament = next;
        drop(tournament);

        log::info!(
            "Scheduled draft {} '{}' in phase {} with {} player(s)",
            draft_id,
            config.cube,
            config.phase,
            config.players.len()
        );

        self.spawn_actor(draft).await;
        Ok(draft_id)
    }

    /// Unseated -> Seated, once every draft of an earlier phase has finished
    pub async fn seat_draft(&self, id: DraftId) -> DraftResult<DraftOutcome> {
        let handle = self.handle(id).await?;
        let phase = handle.snapshot().await?.phase;

        let earlier: Vec<DraftId> = self
            .tournament
            .read()
            .await
            .drafts_before(phase)
            .map(|d| d.id)
            .collect();

        for earlier_id in earlier {
            let earlier_draft = self.handle(earlier_id).await?.snapshot().await?;
            if !earlier_draft.finished() {
                return Err(DraftError::invalid(
                    "seat draft",
                    format!(
                        "draft {} in phase {} has not finished",
                        earlier_id, earlier_draft.phase
                    ),
                ));
            }
        }

        handle.execute(DraftCommand::Seat).await
    }

    /// Pair the next round of a draft and move the event round forward
    pub async fn pair_round(&self, id: DraftId) -> DraftResult<DraftOutcome> {
        let outcome = self.execute(id, DraftCommand::Pair).await?;
        self.refresh_after_commit(id).await;
        Ok(outcome)
    }

    pub async fn finish_round(&self, id: DraftId) -> DraftResult<DraftOutcome> {
        self.execute(id, DraftCommand::FinishRound).await
    }

    pub async fn finish_draft(&self, id: DraftId) -> DraftResult<DraftOutcome> {
        self.execute(id, DraftCommand::FinishDraft).await
    }

    /// Return a draft to unseated; the event round is recomputed
    pub async fn reset_draft(&self, id: DraftId) -> DraftResult<DraftOutcome> {
        let outcome = self.execute(id, DraftCommand::Reset).await?;
        self.refresh_after_commit(id).await;
        Ok(outcome)
    }

    pub async fn report_result(
        &self,
        id: DraftId,
        match_id: MatchId,
        player: PlayerId,
        score: GameScore,
    ) -> DraftResult<DraftOutcome> {
        self.execute(
            id,
            DraftCommand::Report {
                match_id,
                player,
                score,
            },
        )
        .await
    }

    pub async fn confirm_result(
        &self,
        id: DraftId,
        match_id: MatchId,
        actor: Actor,
    ) -> DraftResult<DraftOutcome> {
        self.execute(id, DraftCommand::Confirm { match_id, actor })
            .await
    }

    pub async fn override_result(
        &self,
        id: DraftId,
        match_id: MatchId,
        score: GameScore,
    ) -> DraftResult<DraftOutcome> {
        self.execute(id, DraftCommand::Override { match_id, score })
            .await
    }

    pub async fn check_in(&self, id: DraftId, player: PlayerId) -> DraftResult<DraftOutcome> {
        self.execute(id, DraftCommand::CheckIn { player }).await
    }

    pub async fn check_out(&self, id: DraftId, player: PlayerId) -> DraftResult<DraftOutcome> {
        self.execute(id, DraftCommand::CheckOut { player }).await
    }

    /// Current committed state of one draft
    pub async fn draft_snapshot(&self, id: DraftId) -> DraftResult<Draft> {
        self.handle(id).await?.snapshot().await
    }

    /// Every draft, in schedule order
    pub async fn all_drafts(&self) -> DraftResult<Vec<Draft>> {
        let handles: Vec<DraftHandle> = self.drafts.read().await.values().cloned().collect();

        let mut drafts = Vec::with_capacity(handles.len());
        for handle in handles {
            drafts.push(handle.snapshot().await?);
        }
        drafts.sort_by_key(|d| (d.phase, d.id));
        Ok(drafts)
    }

    /// Latest draft `player` is seated in, preferring later phases
    pub async fn current_draft_for(&self, player: PlayerId) -> DraftResult<Option<Draft>> {
        let drafts = self.all_drafts().await?;
        Ok(drafts
            .into_iter()
            .filter(|d| d.seated() && d.seat_of(player).is_some())
            .max_by_key(|d| (d.phase, d.id)))
    }

    /// The draft change is already stored, so a failed refresh only logs;
    /// the unsaved event round is written by the next refresh.
    async fn refresh_after_commit(&self, draft: DraftId) {
        if let Err(e) = self.refresh_event_round().await {
            log::error!(
                "Event round not saved after draft {} changed: {}",
                draft,
                e
            );
        }
    }

    /// Event round = highest tournament round any draft has paired.
    ///
    /// The tournament lock is held while the drafts are read so concurrent
    /// refreshes apply in order. The in-memory value always follows the
    /// drafts; persisting it may fail and is retried on the next call.
    async fn refresh_event_round(&self) -> DraftResult<()> {
        let mut tournament = self.tournament.write().await;

        let event_round = self
            .all_drafts()
            .await?
            .iter()
            .filter(|d| d.round() > 0)
            .map(|d| d.tournament_round(d.round()))
            .max()
            .unwrap_or(0);

        if tournament.event_round != event_round {
            log::info!(
                "Tournament {} event round {} -> {}",
                tournament.id,
                tournament.event_round,
                event_round
            );
            tournament.event_round = event_round;
            self.event_round_unsaved.store(true, Ordering::SeqCst);
        }

        if self.event_round_unsaved.load(Ordering::SeqCst) {
            self.repository.save_tournament(&tournament).await?;
            self.event_round_unsaved.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Stop every draft actor
    pub async fn shutdown(&self) {
        let handles: Vec<DraftHandle> = self.drafts.write().await.drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.close().await;
        }
        log::info!("Stopped {} draft actor(s)", handles.len());
    }
}

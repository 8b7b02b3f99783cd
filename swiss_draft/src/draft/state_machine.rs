//! Draft aggregate and its round state machine.
//!
//! ```text
//! Unseated -> Seated -> Paired(1) -> RoundFinished(1) -> Paired(2) -> ... -> RoundFinished(n) -> Finished
//! ```
//!
//! Every transition either applies completely or returns an error with the
//! draft untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{DraftError, DraftResult, Missing};
use super::matches::{Actor, GameScore, Match, MatchId, ResultState};
use crate::pairing::{PairingEngine, PairingHistory, PairingPlan, RankedPlayer, SeatRandomizer};
use crate::standings::{StandingsRecord, compute_standings};
use crate::tournament::models::{DraftConfig, DraftId, Player, PlayerId, tournament_round_span};

/// Lifecycle position of a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "round", rename_all = "snake_case")]
pub enum DraftPhase {
    Unseated,
    Seated,
    /// Round is paired and being played
    Paired(u32),
    /// Every match of the round is confirmed
    RoundFinished(u32),
    Finished,
}

/// Round status as the dashboards show it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    NotSeated,
    Seated,
    /// Paired, no results in yet
    Paired,
    /// At least one result reported
    RoundInProgress,
    RoundFinished,
    /// The event has moved on and this draft waits for its next pairings
    AwaitingPairings,
    Finished,
}

/// A player's seat at the draft table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub player: Player,
    /// 1-indexed seat number
    pub seat: u32,
    pub checked_in: bool,
    pub checked_out: bool,
}

/// One draft: its roster, seating and every match played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub cube: String,
    /// Schedule position within the tournament
    pub phase: u32,
    /// Configured number of Swiss rounds
    pub rounds: u32,
    pub pairing_seed: Option<u64>,
    state: DraftPhase,
    roster: Vec<Player>,
    seats: Vec<Seat>,
    matches: Vec<Match>,
    next_match_id: MatchId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Create an unseated draft for `roster`
    pub fn new(id: DraftId, config: &DraftConfig, roster: Vec<Player>) -> Self {
        let now = Utc::now();
        Self {
            id,
            cube: config.cube.clone(),
            phase: config.phase,
            rounds: config.rounds,
            pairing_seed: config.pairing_seed,
            state: DraftPhase::Unseated,
            roster,
            seats: Vec::new(),
            matches: Vec::new(),
            next_match_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> DraftPhase {
        self.state
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// Seats in seat order, empty until seated
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Current draft round, 0 before the first pairing
    pub fn round(&self) -> u32 {
        match self.state {
            DraftPhase::Unseated | DraftPhase::Seated => 0,
            DraftPhase::Paired(round) | DraftPhase::RoundFinished(round) => round,
            DraftPhase::Finished => self.rounds,
        }
    }

    pub fn seated(&self) -> bool {
        self.state != DraftPhase::Unseated
    }

    pub fn in_progress(&self) -> bool {
        matches!(self.state, DraftPhase::Paired(_))
    }

    pub fn finished(&self) -> bool {
        self.state == DraftPhase::Finished
    }

    /// Last round whose results are final
    pub fn last_finished_round(&self) -> u32 {
        match self.state {
            DraftPhase::Paired(round) => round - 1,
            DraftPhase::RoundFinished(round) => round,
            DraftPhase::Finished => self.rounds,
            DraftPhase::Unseated | DraftPhase::Seated => 0,
        }
    }

    /// Player IDs in seat order once seated, roster order before
    pub fn player_ids(&self) -> Vec<PlayerId> {
        if self.seats.is_empty() {
            self.roster.iter().map(|p| p.id).collect()
        } else {
            self.seats.iter().map(|s| s.player.id).collect()
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn seat_of(&self, id: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player.id == id)
    }

    pub fn find_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn round_matches(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// `player`'s match in `round`
    pub fn match_for(&self, player: PlayerId, round: u32) -> Option<&Match> {
        self.round_matches(round).find(|m| m.involves(player))
    }

    /// Tournament round number of draft round `round`
    pub fn tournament_round(&self, round: u32) -> u32 {
        let (first, _) = tournament_round_span(self.phase, self.rounds);
        first.saturating_add(round.saturating_sub(1))
    }

    /// Standings over every confirmed match
    pub fn standings(&self) -> Vec<StandingsRecord> {
        compute_standings(&self.player_ids(), &self.matches)
    }

    /// Standings over confirmed matches of rounds `1..=round`
    pub fn standings_through(&self, round: u32) -> Vec<StandingsRecord> {
        compute_standings(
            &self.player_ids(),
            self.matches.iter().filter(|m| m.round <= round),
        )
    }

    /// Status relative to the tournament's current round
    pub fn round_status(&self, event_round: u32) -> RoundStatus {
        match self.state {
            DraftPhase::Unseated => RoundStatus::NotSeated,
            DraftPhase::Seated => RoundStatus::Seated,
            DraftPhase::Paired(round) => {
                let started = self
                    .round_matches(round)
                    .any(|m| !m.is_bye() && m.state() != ResultState::Pending);
                if started {
                    RoundStatus::RoundInProgress
                } else {
                    RoundStatus::Paired
                }
            }
            DraftPhase::RoundFinished(round) => {
                if event_round > self.tournament_round(round) {
                    RoundStatus::AwaitingPairings
                } else {
                    RoundStatus::RoundFinished
                }
            }
            DraftPhase::Finished => RoundStatus::Finished,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Unseated -> Seated
    pub fn seat(&mut self, randomizer: &mut SeatRandomizer) -> DraftResult<()> {
        if self.state != DraftPhase::Unseated {
            return Err(DraftError::invalid("seat draft", "draft is already seated"));
        }

        if self.roster.is_empty() {
            return Err(DraftError::invalid("seat draft", "draft has no players"));
        }

        let ids: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        let mut seats = Vec::with_capacity(ids.len());
        for (id, seat) in randomizer.assign_seats(&ids) {
            let player = self
                .player(id)
                .cloned()
                .ok_or(DraftError::NotFound(Missing::Player(id)))?;
            seats.push(Seat {
                player,
                seat,
                checked_in: false,
                checked_out: false,
            });
        }

        self.seats = seats;
        self.state = DraftPhase::Seated;
        self.touch();

        log::info!(
            "Draft {} ({}) seated with {} player(s)",
            self.id,
            self.cube,
            self.seats.len()
        );
        Ok(())
    }

    /// Seated -> Paired(1), or RoundFinished(k) -> Paired(k + 1)
    pub fn pair(
        &mut self,
        engine: &PairingEngine,
        randomizer: &mut SeatRandomizer,
    ) -> DraftResult<PairingPlan> {
        let round = match self.state {
            DraftPhase::Seated => 1,
            DraftPhase::RoundFinished(done) if done < self.rounds => done + 1,
            DraftPhase::RoundFinished(_) => {
                return Err(DraftError::invalid(
                    "pair round",
                    format!("all {} rounds have been played", self.rounds),
                ));
            }
            DraftPhase::Unseated => {
                return Err(DraftError::invalid("pair round", "draft is not seated"));
            }
            DraftPhase::Paired(current) => {
                return Err(DraftError::invalid(
                    "pair round",
                    format!("round {current} is still in progress"),
                ));
            }
            DraftPhase::Finished => {
                return Err(DraftError::invalid("pair round", "draft is finished"));
            }
        };

        let ranked: Vec<RankedPlayer> = if round == 1 {
            randomizer
                .shuffle_order(&self.player_ids())
                .into_iter()
                .map(|id| RankedPlayer { id, points: 0 })
                .collect()
        } else {
            self.standings()
                .into_iter()
                .map(|r| RankedPlayer {
                    id: r.player,
                    points: r.points,
                })
                .collect()
        };

        let history = PairingHistory::from_matches(&self.matches);
        let plan = engine.pair(round, &ranked, &history).inspect_err(|conflict| {
            log::warn!("Draft {} round {} not paired: {}", self.id, round, conflict);
        })?;

        for pairing in &plan.pairings {
            let id = self.allocate_match_id();
            self.matches.push(Match::new(
                id,
                round,
                pairing.table,
                pairing.player1,
                pairing.player2,
            ));
        }

        if let Some(player) = plan.bye {
            let id = self.allocate_match_id();
            self.matches
                .push(Match::bye(id, round, plan.bye_table(), player));
        }

        self.state = DraftPhase::Paired(round);
        self.touch();

        log::info!(
            "Draft {} paired round {}: {} table(s){}",
            self.id,
            round,
            plan.pairings.len(),
            plan.bye
                .map(|p| format!(", bye for player {p}"))
                .unwrap_or_default()
        );
        if !plan.downfloats.is_empty() {
            log::debug!(
                "Draft {} round {}: paired down {:?}",
                self.id,
                round,
                plan.downfloats
            );
        }
        Ok(plan)
    }

    fn allocate_match_id(&mut self) -> MatchId {
        let id = self.next_match_id;
        self.next_match_id += 1;
        id
    }

    /// Paired(k) -> RoundFinished(k), once every match of round k is confirmed
    pub fn finish_round(&mut self) -> DraftResult<u32> {
        let DraftPhase::Paired(round) = self.state else {
            return Err(DraftError::invalid(
                "finish round",
                "no round is in progress",
            ));
        };

        let pending = self
            .round_matches(round)
            .filter(|m| !m.is_confirmed())
            .count();
        if pending > 0 {
            return Err(DraftError::IncompleteRound { round, pending });
        }

        self.state = DraftPhase::RoundFinished(round);
        self.touch();

        log::info!("Draft {} finished round {}", self.id, round);
        Ok(round)
    }

    /// RoundFinished(last) -> Finished
    pub fn finish(&mut self) -> DraftResult<()> {
        match self.state {
            DraftPhase::RoundFinished(round) if round == self.rounds => {}
            DraftPhase::RoundFinished(round) => {
                return Err(DraftError::invalid(
                    "finish draft",
                    format!("only {round} of {} rounds played", self.rounds),
                ));
            }
            _ => {
                return Err(DraftError::invalid(
                    "finish draft",
                    "the final round has not finished",
                ));
            }
        }

        self.state = DraftPhase::Finished;
        self.touch();

        log::info!("Draft {} ({}) finished", self.id, self.cube);
        Ok(())
    }

    /// Back to Unseated, dropping seats, matches and check-ins
    pub fn reset(&mut self) {
        self.state = DraftPhase::Unseated;
        self.seats.clear();
        self.matches.clear();
        self.next_match_id = 1;
        self.touch();

        log::info!("Draft {} reset", self.id);
    }

    /// Match of the round being played, for a result mutation
    fn open_match_mut(&mut self, id: MatchId, action: &'static str) -> DraftResult<&mut Match> {
        let state = self.state;
        let m = self
            .matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DraftError::NotFound(Missing::Match(id)))?;

        if state != DraftPhase::Paired(m.round) {
            return Err(DraftError::invalid(
                action,
                format!("round {} is not being played", m.round),
            ));
        }

        Ok(m)
    }

    pub fn report(&mut self, id: MatchId, reporter: PlayerId, score: GameScore) -> DraftResult<()> {
        self.open_match_mut(id, "report result")?
            .report(reporter, score)?;
        self.touch();

        log::info!(
            "Draft {} match {}: player {} reported {}",
            self.id,
            id,
            reporter,
            score
        );
        Ok(())
    }

    pub fn confirm(&mut self, id: MatchId, actor: Actor) -> DraftResult<()> {
        self.open_match_mut(id, "confirm result")?.confirm(actor)?;
        self.touch();

        log::info!("Draft {} match {}: result confirmed by {:?}", self.id, id, actor);
        Ok(())
    }

    pub fn override_result(&mut self, id: MatchId, score: GameScore) -> DraftResult<()> {
        self.open_match_mut(id, "override result")?
            .override_result(score)?;
        self.touch();

        log::info!("Draft {} match {}: operator set {}", self.id, id, score);
        Ok(())
    }

    fn seat_mut(&mut self, player: PlayerId, action: &'static str) -> DraftResult<&mut Seat> {
        if self.seats.is_empty() {
            return Err(DraftError::invalid(action, "draft is not seated"));
        }

        self.seats
            .iter_mut()
            .find(|s| s.player.id == player)
            .ok_or(DraftError::NotFound(Missing::Player(player)))
    }

    pub fn check_in(&mut self, player: PlayerId) -> DraftResult<()> {
        self.seat_mut(player, "check in")?.checked_in = true;
        self.touch();
        Ok(())
    }

    pub fn check_out(&mut self, player: PlayerId) -> DraftResult<()> {
        let seat = self.seat_mut(player, "check out")?;
        if !seat.checked_in {
            return Err(DraftError::invalid(
                "check out",
                format!("player {player} has not checked in"),
            ));
        }
        seat.checked_out = true;
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::PairingConflict;
    use crate::tournament::models::Pronouns;

    fn draft(players: i64, rounds: u32) -> Draft {
        let roster: Vec<Player> = (1..=players)
            .map(|id| Player::new(id, format!("Player {id}"), Pronouns::Unspecified))
            .collect();
        let ids = roster.iter().map(|p| p.id).collect();
        let config = DraftConfig::new("Vintage Cube", 1, ids).with_rounds(rounds);
        Draft::new(1, &config, roster)
    }

    fn settle_round(draft: &mut Draft) {
        let round = draft.round();
        let ids: Vec<(MatchId, PlayerId, PlayerId)> = draft
            .round_matches(round)
            .filter_map(|m| m.player2.map(|p2| (m.id, m.player1, p2)))
            .collect();
        for (id, p1, p2) in ids {
            draft.report(id, p1, GameScore::new(2, 1)).unwrap();
            draft.confirm(id, Actor::Player(p2)).unwrap();
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut d = draft(8, 3);
        let engine = PairingEngine::new();
        let mut rng = SeatRandomizer::seeded(7);

        d.seat(&mut rng).unwrap();
        assert!(d.seated());
        assert_eq!(d.round(), 0);

        for round in 1..=3 {
            let plan = d.pair(&engine, &mut rng).unwrap();
            assert_eq!(plan.pairings.len(), 4);
            assert_eq!(d.state(), DraftPhase::Paired(round));
            assert!(d.in_progress());
            settle_round(&mut d);
            assert_eq!(d.finish_round().unwrap(), round);
            assert!(!d.in_progress());
        }

        assert!(d.pair(&engine, &mut rng).is_err());
        d.finish().unwrap();
        assert!(d.finished());
        assert_eq!(d.round(), 3);
        assert_eq!(d.matches().len(), 12);
    }

    #[test]
    fn test_pair_before_seat_is_invalid() {
        let mut d = draft(4, 3);
        let err = d
            .pair(&PairingEngine::new(), &mut SeatRandomizer::seeded(1))
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidTransition { .. }));
        assert_eq!(d.state(), DraftPhase::Unseated);
    }

    #[test]
    fn test_seat_requires_players() {
        let mut d = draft(0, 3);
        assert!(d.seat(&mut SeatRandomizer::seeded(1)).is_err());
        assert!(!d.seated());
    }

    #[test]
    fn test_five_players_get_a_bye() {
        let mut d = draft(5, 3);
        let mut rng = SeatRandomizer::seeded(3);
        d.seat(&mut rng).unwrap();
        let plan = d.pair(&PairingEngine::new(), &mut rng).unwrap();

        assert_eq!(plan.pairings.len(), 2);
        let bye = d.round_matches(1).find(|m| m.is_bye()).unwrap();
        assert_eq!(Some(bye.player1), plan.bye);
        assert_eq!(bye.table, 3);
        assert!(bye.is_confirmed());
        assert_eq!(bye.reported_by(), None);

        let standings = d.standings();
        let record = standings.iter().find(|r| r.player == bye.player1).unwrap();
        assert_eq!(record.points, 3);
    }

    #[test]
    fn test_finish_round_requires_confirmation() {
        let mut d = draft(4, 3);
        let mut rng = SeatRandomizer::seeded(5);
        d.seat(&mut rng).unwrap();
        d.pair(&PairingEngine::new(), &mut rng).unwrap();

        let m = d.round_matches(1).next().unwrap().clone();
        d.report(m.id, m.player1, GameScore::new(2, 0)).unwrap();

        let err = d.finish_round().unwrap_err();
        assert!(matches!(err, DraftError::IncompleteRound { round: 1, pending: 2 }));
        assert_eq!(d.state(), DraftPhase::Paired(1));
        assert_eq!(d.round_status(1), RoundStatus::RoundInProgress);
    }

    #[test]
    fn test_finished_round_is_immutable() {
        let mut d = draft(4, 3);
        let mut rng = SeatRandomizer::seeded(5);
        d.seat(&mut rng).unwrap();
        d.pair(&PairingEngine::new(), &mut rng).unwrap();
        settle_round(&mut d);
        d.finish_round().unwrap();

        let id = d.round_matches(1).next().unwrap().id;
        let err = d.override_result(id, GameScore::new(0, 2)).unwrap_err();
        assert!(matches!(err, DraftError::InvalidTransition { .. }));
        assert_eq!(
            d.find_match(id).map(|m| m.state()),
            Some(ResultState::Confirmed)
        );
    }

    #[test]
    fn test_conflict_leaves_state_unchanged() {
        // Two players can only meet once
        let mut d = draft(2, 2);
        let mut rng = SeatRandomizer::seeded(9);
        let engine = PairingEngine::new();
        d.seat(&mut rng).unwrap();
        d.pair(&engine, &mut rng).unwrap();
        settle_round(&mut d);
        d.finish_round().unwrap();

        let before = d.clone();
        let err = d.pair(&engine, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            DraftError::PairingConflict(PairingConflict::NoValidPairing { round: 2 })
        ));
        assert_eq!(d, before);
    }

    #[test]
    fn test_round_status_tracks_event_round() {
        let mut d = draft(4, 3);
        let mut rng = SeatRandomizer::seeded(2);
        assert_eq!(d.round_status(0), RoundStatus::NotSeated);
        d.seat(&mut rng).unwrap();
        assert_eq!(d.round_status(0), RoundStatus::Seated);
        d.pair(&PairingEngine::new(), &mut rng).unwrap();
        assert_eq!(d.round_status(1), RoundStatus::Paired);
        settle_round(&mut d);
        d.finish_round().unwrap();
        assert_eq!(d.round_status(1), RoundStatus::RoundFinished);
        assert_eq!(d.round_status(2), RoundStatus::AwaitingPairings);
    }

    #[test]
    fn test_check_in_and_out() {
        let mut d = draft(2, 1);
        assert!(matches!(
            d.check_in(1),
            Err(DraftError::InvalidTransition { .. })
        ));
        d.seat(&mut SeatRandomizer::seeded(1)).unwrap();
        assert!(d.check_out(1).is_err());
        d.check_in(1).unwrap();
        d.check_out(1).unwrap();
        assert!(d.seat_of(1).is_some_and(|s| s.checked_in && s.checked_out));
        assert!(matches!(
            d.check_in(9),
            Err(DraftError::NotFound(Missing::Player(9)))
        ));
    }

    #[test]
    fn test_reset() {
        let mut d = draft(4, 3);
        let mut rng = SeatRandomizer::seeded(4);
        d.seat(&mut rng).unwrap();
        d.pair(&PairingEngine::new(), &mut rng).unwrap();
        d.reset();
        assert_eq!(d.state(), DraftPhase::Unseated);
        assert!(d.matches().is_empty());
        assert!(d.seats().is_empty());
        assert_eq!(d.roster().len(), 4);
    }
}

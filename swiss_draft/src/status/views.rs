//! Read projections served to dashboards.
//!
//! Every projection is a pure function of committed state. "Not yet
//! available" is a successful response carrying an `error` string, never an
//! `Err`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::draft::{Draft, Match, MatchId, Outcome, RoundStatus};
use crate::standings::{StandingsRecord, compute_standings};
use crate::tournament::models::{DraftId, PlayerId, TimetableEntry, Tournament};

pub const NOT_STARTED: &str = "Not started.";
pub const NO_CHECKIN: &str = "No checkin.";
pub const NO_MATCH_YET: &str = "No match yet.";
pub const NO_PAIRINGS_YET: &str = "No pairings yet.";
pub const NOT_SEATED: &str = "Draft has not been seated yet.";
pub const NO_DRAFT_STANDINGS: &str = "No draft standings yet";
pub const NO_EVENT_STANDINGS: &str = "No event standings yet";

/// `{ "error": "..." }` body for data that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotYet {
    pub error: String,
}

impl NotYet {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn name_of(names: &HashMap<PlayerId, String>, id: PlayerId) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("Player {id}"))
}

fn draft_names(draft: &Draft) -> HashMap<PlayerId, String> {
    draft
        .roster()
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect()
}

/// Draft summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftStatus {
    pub id: DraftId,
    pub cube: String,
    pub phase: u32,
    pub paired: bool,
    pub finished: bool,
    pub seated: bool,
    pub in_progress: bool,
    pub round_finished: bool,
    pub draft_round: u32,
    pub event_round: u32,
    pub round_status: RoundStatus,
    pub players: Vec<String>,
}

pub fn draft_status(draft: &Draft, event_round: u32) -> DraftStatus {
    let names = draft_names(draft);
    DraftStatus {
        id: draft.id,
        cube: draft.cube.clone(),
        phase: draft.phase,
        paired: draft.round() > 0,
        finished: draft.finished(),
        seated: draft.seated(),
        in_progress: draft.in_progress(),
        round_finished: draft.seated() && !draft.in_progress() && draft.round() > 0,
        draft_round: draft.round(),
        event_round,
        round_status: draft.round_status(event_round),
        players: draft
            .player_ids()
            .into_iter()
            .map(|id| name_of(&names, id))
            .collect(),
    }
}

/// Operator view of one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminMatchStatus {
    pub id: MatchId,
    pub round: u32,
    pub table: u32,
    pub player1: String,
    pub player2: Option<String>,
    pub bye: bool,
    pub result: String,
    pub result_confirmed: bool,
    pub reported_by: Option<String>,
    pub player1_wins: u8,
    pub player2_wins: u8,
    pub draws: u8,
}

fn admin_match(m: &Match, names: &HashMap<PlayerId, String>) -> AdminMatchStatus {
    let score = m.score();
    AdminMatchStatus {
        id: m.id,
        round: m.round,
        table: m.table,
        player1: name_of(names, m.player1),
        player2: m.player2.map(|p| name_of(names, p)),
        bye: m.is_bye(),
        result: m.display_result(),
        result_confirmed: m.is_confirmed(),
        reported_by: m.reported_by().map(|p| name_of(names, p)),
        player1_wins: score.map_or(0, |s| s.player1_wins),
        player2_wins: score.map_or(0, |s| s.player2_wins),
        draws: score.map_or(0, |s| s.draws),
    }
}

/// Operator view of the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRoundStatus {
    pub round: u32,
    pub matches: Vec<AdminMatchStatus>,
}

pub fn admin_round(draft: &Draft) -> AdminRoundStatus {
    let names = draft_names(draft);
    let round = draft.round();
    let mut matches: Vec<AdminMatchStatus> = draft
        .round_matches(round)
        .map(|m| admin_match(m, &names))
        .collect();
    matches.sort_by_key(|m| m.table);
    AdminRoundStatus { round, matches }
}

/// A player's own match, seen from their side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatch {
    pub id: MatchId,
    pub name: String,
    pub table: u32,
    pub round: u32,
    pub opponent: String,
    pub opp_pronouns: String,
    /// Name of the winner by reported games, `None` while pending or drawn
    pub winner: Option<String>,
    pub result: String,
    pub result_confirmed: bool,
    pub reported_by: Option<String>,
    /// Whether the viewer is player 1 or player 2 of the match
    pub player_role: u8,
}

/// A player's bye
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBye {
    pub name: String,
    pub round: u32,
    pub table: u32,
    pub bye: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerMatchView {
    Match(PlayerMatch),
    Bye(PlayerBye),
    NotYet(NotYet),
}

/// `player`'s match in the draft's current round
pub fn player_match(draft: Option<&Draft>, player: PlayerId) -> PlayerMatchView {
    let Some(draft) = draft.filter(|d| d.round() > 0) else {
        return PlayerMatchView::NotYet(NotYet::new(NOT_STARTED));
    };

    if !draft.seat_of(player).is_some_and(|s| s.checked_in) {
        return PlayerMatchView::NotYet(NotYet::new(NO_CHECKIN));
    }

    let names = draft_names(draft);
    let Some(m) = draft.match_for(player, draft.round()) else {
        return PlayerMatchView::NotYet(NotYet::new(NO_MATCH_YET));
    };

    let Some(opponent) = m.opponent_of(player) else {
        return PlayerMatchView::Bye(PlayerBye {
            name: name_of(&names, player),
            round: m.round,
            table: m.table,
            bye: true,
        });
    };

    let opp_pronouns = draft
        .player(opponent)
        .map(|p| p.pronouns.label().to_string())
        .unwrap_or_default();

    PlayerMatchView::Match(PlayerMatch {
        id: m.id,
        name: name_of(&names, player),
        table: m.table,
        round: m.round,
        opponent: name_of(&names, opponent),
        opp_pronouns,
        winner: m.winner().map(|w| name_of(&names, w)),
        result: m.display_result_for(player),
        result_confirmed: m.is_confirmed(),
        reported_by: m.reported_by().map(|p| name_of(&names, p)),
        player_role: if m.player1 == player { 1 } else { 2 },
    })
}

/// One standings row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsLine {
    pub rank: usize,
    pub name: String,
    pub score: u32,
    pub omw: f64,
    pub pgw: f64,
    pub ogw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsTable {
    pub current_round: u32,
    pub standings: Vec<StandingsLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StandingsResponse {
    Ready(StandingsTable),
    NotYet(NotYet),
}

fn standings_lines(
    records: &[StandingsRecord],
    names: &HashMap<PlayerId, String>,
) -> Vec<StandingsLine> {
    records
        .iter()
        .enumerate()
        .map(|(idx, r)| StandingsLine {
            rank: idx + 1,
            name: name_of(names, r.player),
            score: r.points,
            omw: round2(r.omwp),
            pgw: round2(r.gwp),
            ogw: round2(r.ogwp),
        })
        .collect()
}

/// Draft standings as of the last finished round.
///
/// Results confirmed in the round being played count once it finishes.
pub fn draft_standings(draft: &Draft) -> StandingsResponse {
    let through = draft.last_finished_round();
    if through == 0 {
        return StandingsResponse::NotYet(NotYet::new(NO_DRAFT_STANDINGS));
    }

    StandingsResponse::Ready(StandingsTable {
        current_round: through,
        standings: standings_lines(&draft.standings_through(through), &draft_names(draft)),
    })
}

/// Standings over every draft of the tournament
pub fn event_standings(tournament: &Tournament, drafts: &[Draft]) -> StandingsResponse {
    if drafts.iter().all(|d| d.last_finished_round() == 0) {
        return StandingsResponse::NotYet(NotYet::new(NO_EVENT_STANDINGS));
    }

    let players: Vec<PlayerId> = tournament.players.iter().map(|p| p.id).collect();
    let names: HashMap<PlayerId, String> = tournament
        .players
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();
    let finished = drafts.iter().flat_map(|d| {
        let through = d.last_finished_round();
        d.matches().iter().filter(move |m| m.round <= through)
    });
    let records = compute_standings(&players, finished);
    let current_round = drafts
        .iter()
        .filter(|d| d.last_finished_round() > 0)
        .map(|d| d.tournament_round(d.last_finished_round()))
        .max()
        .unwrap_or(0);

    StandingsResponse::Ready(StandingsTable {
        current_round,
        standings: standings_lines(&records, &names),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingLine {
    pub seat: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seatings {
    pub seatings: Vec<SeatingLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeatingsResponse {
    Ready(Seatings),
    NotYet(NotYet),
}

pub fn seatings(draft: &Draft) -> SeatingsResponse {
    if !draft.seated() {
        return SeatingsResponse::NotYet(NotYet::new(NOT_SEATED));
    }

    SeatingsResponse::Ready(Seatings {
        seatings: draft
            .seats()
            .iter()
            .map(|s| SeatingLine {
                seat: s.seat,
                name: s.player.name.clone(),
            })
            .collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingLine {
    pub table: u32,
    pub player1: String,
    pub player2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairings {
    pub round: u32,
    pub other_pairings: Vec<PairingLine>,
    /// Bye recipient, `None` when there is no bye or the viewer has it
    pub bye: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PairingsResponse {
    Ready(Pairings),
    NotYet(NotYet),
}

/// Current round's pairings other than the viewer's own match
///
/// Only names and tables are listed; scores stay with the two players.
pub fn pairings(draft: &Draft, viewer: Option<PlayerId>) -> PairingsResponse {
    let round = draft.round();
    if round == 0 {
        return PairingsResponse::NotYet(NotYet::new(NO_PAIRINGS_YET));
    }

    if let Some(viewer) = viewer
        && !draft.seat_of(viewer).is_some_and(|s| s.checked_in)
    {
        return PairingsResponse::NotYet(NotYet::new(NO_CHECKIN));
    }

    let names = draft_names(draft);
    let mut other_pairings = Vec::new();
    let mut bye = None;

    for m in draft.round_matches(round) {
        if viewer.is_some_and(|v| m.involves(v)) {
            continue;
        }
        match m.player2 {
            Some(player2) => other_pairings.push(PairingLine {
                table: m.table,
                player1: name_of(&names, m.player1),
                player2: name_of(&names, player2),
            }),
            None => bye = Some(name_of(&names, m.player1)),
        }
    }
    other_pairings.sort_by_key(|p| p.table);

    PairingsResponse::Ready(Pairings {
        round,
        other_pairings,
        bye,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub timetable: Vec<TimetableEntry>,
}

pub fn timetable(tournament: &Tournament, player: PlayerId) -> Timetable {
    Timetable {
        timetable: tournament.timetable(player),
    }
}

/// Result of a finished match from one player's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOutcome {
    Win,
    Loss,
    Draw,
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub draft_id: DraftId,
    pub cube: String,
    pub round: u32,
    pub event_round: u32,
    pub opponent: Option<String>,
    pub outcome: HistoryOutcome,
    /// Games from the player's side, e.g. "2-1"
    pub score: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHistory {
    pub name: String,
    pub matches: Vec<HistoryEntry>,
}

/// Confirmed matches of `player` across every draft, oldest first
pub fn match_history(tournament: &Tournament, drafts: &[Draft], player: PlayerId) -> MatchHistory {
    let names: HashMap<PlayerId, String> = tournament
        .players
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();

    let mut matches = Vec::new();
    for draft in drafts {
        for m in draft.matches().iter().filter(|m| m.involves(player)) {
            let Some(score) = m.confirmed_score() else {
                continue;
            };
            let own = if m.player1 == player { score } else { score.flipped() };

            let outcome = match (m.is_bye(), own.outcome()) {
                (true, _) => HistoryOutcome::Bye,
                (false, Outcome::Player1Win) => HistoryOutcome::Win,
                (false, Outcome::Player2Win) => HistoryOutcome::Loss,
                (false, Outcome::Draw) => HistoryOutcome::Draw,
            };

            matches.push(HistoryEntry {
                draft_id: draft.id,
                cube: draft.cube.clone(),
                round: m.round,
                event_round: draft.tournament_round(m.round),
                opponent: m.opponent_of(player).map(|o| name_of(&names, o)),
                outcome,
                score: own.to_string(),
            });
        }
    }
    matches.sort_by_key(|e| (e.event_round, e.draft_id));

    MatchHistory {
        name: name_of(&names, player),
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Actor, GameScore};
    use crate::pairing::{PairingEngine, SeatRandomizer};
    use crate::tournament::models::{DraftConfig, Player, Pronouns};

    fn paired_draft(players: i64) -> Draft {
        let roster: Vec<Player> = (1..=players)
            .map(|id| Player::new(id, format!("P{id}"), Pronouns::TheyThem))
            .collect();
        let config = DraftConfig::new("Pauper", 1, roster.iter().map(|p| p.id).collect());
        let mut draft = Draft::new(1, &config, roster);
        let mut rng = SeatRandomizer::seeded(21);
        draft.seat(&mut rng).unwrap();
        draft.pair(&PairingEngine::new(), &mut rng).unwrap();
        draft
    }

    #[test]
    fn test_not_yet_serializes_as_error_object() {
        let roster = vec![Player::new(1, "Solo", Pronouns::Unspecified)];
        let draft = Draft::new(1, &DraftConfig::new("Pauper", 1, vec![1]), roster);

        let json = serde_json::to_value(seatings(&draft)).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Draft has not been seated yet." }));

        let json = serde_json::to_value(draft_standings(&draft)).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "No draft standings yet" }));

        let json = serde_json::to_value(pairings(&draft, None)).unwrap();
        assert_eq!(json["error"], "No pairings yet.");
    }

    #[test]
    fn test_player_match_requires_checkin() {
        let mut draft = paired_draft(4);
        assert_eq!(
            player_match(Some(&draft), 1),
            PlayerMatchView::NotYet(NotYet::new(NO_CHECKIN))
        );

        draft.check_in(1).unwrap();
        let PlayerMatchView::Match(view) = player_match(Some(&draft), 1) else {
            panic!("expected a match view");
        };
        assert_eq!(view.name, "P1");
        assert_eq!(view.result, "Pending");
        assert_eq!(view.opp_pronouns, "(they/them)");
        assert_eq!(view.winner, None);

        assert_eq!(
            player_match(None, 1),
            PlayerMatchView::NotYet(NotYet::new(NOT_STARTED))
        );
    }

    #[test]
    fn test_player_match_from_viewer_side() {
        let mut draft = paired_draft(2);
        draft.check_in(1).unwrap();
        draft.check_in(2).unwrap();
        let m = draft.round_matches(1).next().unwrap().clone();

        draft.report(m.id, m.player1, GameScore::new(1, 2)).unwrap();
        let PlayerMatchView::Match(p2_view) = player_match(Some(&draft), m.player2.unwrap()) else {
            panic!("expected a match view");
        };
        assert_eq!(p2_view.result, "2-1 (awaiting confirmation)");
        assert_eq!(p2_view.winner.as_deref(), Some(p2_view.name.as_str()));
        assert!(!p2_view.result_confirmed);
    }

    #[test]
    fn test_bye_view_and_pairings_redaction() {
        let mut draft = paired_draft(3);
        let bye_player = draft
            .round_matches(1)
            .find(|m| m.is_bye())
            .map(|m| m.player1)
            .unwrap();
        let other = (1..=3).find(|p| *p != bye_player).unwrap();
        draft.check_in(bye_player).unwrap();
        draft.check_in(other).unwrap();

        assert!(matches!(
            player_match(Some(&draft), bye_player),
            PlayerMatchView::Bye(PlayerBye { bye: true, .. })
        ));

        let PairingsResponse::Ready(own) = pairings(&draft, Some(bye_player)) else {
            panic!("expected pairings");
        };
        assert_eq!(own.bye, None);
        assert_eq!(own.other_pairings.len(), 1);

        let PairingsResponse::Ready(theirs) = pairings(&draft, Some(other)) else {
            panic!("expected pairings");
        };
        assert!(theirs.other_pairings.is_empty());
        assert_eq!(theirs.bye, Some(format!("P{bye_player}")));
    }

    #[test]
    fn test_admin_round_and_standings() {
        let mut draft = paired_draft(4);
        let ids: Vec<(MatchId, PlayerId, PlayerId)> = draft
            .round_matches(1)
            .map(|m| (m.id, m.player1, m.player2.unwrap()))
            .collect();

        draft.report(ids[0].0, ids[0].1, GameScore::new(2, 1)).unwrap();
        let admin = admin_round(&draft);
        assert_eq!(admin.matches[0].result, "2-1 (awaiting confirmation)");
        assert_eq!(admin.matches[0].reported_by, Some(format!("P{}", ids[0].1)));
        assert_eq!(admin.matches[1].result, "Pending");

        for (id, p1, p2) in &ids {
            if *id != ids[0].0 {
                draft.report(*id, *p1, GameScore::new(2, 0)).unwrap();
            }
            draft.confirm(*id, Actor::Player(*p2)).unwrap();
        }
        draft.finish_round().unwrap();

        let StandingsResponse::Ready(table) = draft_standings(&draft) else {
            panic!("expected standings");
        };
        assert_eq!(table.current_round, 1);
        assert_eq!(table.standings.len(), 4);
        assert_eq!(table.standings[0].score, 3);
        assert_eq!(table.standings[3].score, 0);
        assert_eq!(table.standings[3].pgw, 0.33);
    }

    fn confirm_round(draft: &mut Draft, round: u32) {
        let ids: Vec<(MatchId, PlayerId, PlayerId)> = draft
            .round_matches(round)
            .filter_map(|m| m.player2.map(|p2| (m.id, m.player1, p2)))
            .collect();
        for (id, p1, p2) in ids {
            draft.report(id, p1, GameScore::new(2, 0)).unwrap();
            draft.confirm(id, Actor::Player(p2)).unwrap();
        }
    }

    #[test]
    fn test_standings_exclude_round_in_progress() {
        let mut draft = paired_draft(4);
        confirm_round(&mut draft, 1);
        draft.finish_round().unwrap();
        let before = draft_standings(&draft);

        let mut rng = SeatRandomizer::seeded(22);
        draft.pair(&PairingEngine::new(), &mut rng).unwrap();
        confirm_round(&mut draft, 2);

        // Round 2 is complete but not finished yet
        assert_eq!(draft_standings(&draft), before);
        let StandingsResponse::Ready(table) = before else {
            panic!("expected standings");
        };
        assert_eq!(table.current_round, 1);

        let mut tournament = Tournament::new(1, "Cube Open");
        for id in 1..=4 {
            tournament.enroll(format!("P{id}"), Pronouns::TheyThem);
        }
        let StandingsResponse::Ready(event) = event_standings(&tournament, &[draft.clone()]) else {
            panic!("expected event standings");
        };
        assert_eq!(event.current_round, 1);
        assert_eq!(event.standings[0].score, 3);

        draft.finish_round().unwrap();
        let StandingsResponse::Ready(table) = draft_standings(&draft) else {
            panic!("expected standings");
        };
        assert_eq!(table.current_round, 2);
        assert_eq!(table.standings[0].score, 6);
    }

    #[test]
    fn test_draft_status() {
        let draft = paired_draft(4);
        let status = draft_status(&draft, 1);
        assert!(status.seated && status.paired && status.in_progress);
        assert!(!status.finished);
        assert_eq!(status.draft_round, 1);
        assert_eq!(status.round_status, RoundStatus::Paired);
        assert_eq!(status.players.len(), 4);
    }
}

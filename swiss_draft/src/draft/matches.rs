//! Matches and the two-phase result protocol (report, then confirm).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{DraftError, DraftResult};
use crate::tournament::models::PlayerId;

/// Match ID type, unique within a draft
pub type MatchId = u32;

/// Most games a side can win in a best-of-three
pub const GAMES_TO_WIN: u8 = 2;

/// Most games a best-of-three match can contain
pub const MAX_GAMES: u8 = 3;

/// Game score of a match, from player 1's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub player1_wins: u8,
    pub player2_wins: u8,
    #[serde(default)]
    pub draws: u8,
}

/// Match outcome from player 1's side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Player1Win,
    Player2Win,
    Draw,
}

impl GameScore {
    /// Score recorded for a bye
    pub const BYE: GameScore = GameScore {
        player1_wins: 2,
        player2_wins: 0,
        draws: 0,
    };

    pub fn new(player1_wins: u8, player2_wins: u8) -> Self {
        Self {
            player1_wins,
            player2_wins,
            draws: 0,
        }
    }

    pub fn with_draws(mut self, draws: u8) -> Self {
        self.draws = draws;
        self
    }

    /// Check the score is a legal best-of-three result
    pub fn validate(&self) -> DraftResult<()> {
        if self.player1_wins > GAMES_TO_WIN || self.player2_wins > GAMES_TO_WIN {
            return Err(DraftError::InvalidScore(format!(
                "{self}: a side cannot win more than {GAMES_TO_WIN} games"
            )));
        }

        if self.games_played() > u32::from(MAX_GAMES) {
            return Err(DraftError::InvalidScore(format!(
                "{self}: at most {MAX_GAMES} games are played"
            )));
        }

        if self.games_played() == 0 {
            return Err(DraftError::InvalidScore(
                "at least one game must be recorded".to_string(),
            ));
        }

        Ok(())
    }

    pub fn outcome(&self) -> Outcome {
        match self.player1_wins.cmp(&self.player2_wins) {
            std::cmp::Ordering::Greater => Outcome::Player1Win,
            std::cmp::Ordering::Less => Outcome::Player2Win,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn games_played(&self) -> u32 {
        u32::from(self.player1_wins) + u32::from(self.player2_wins) + u32::from(self.draws)
    }

    /// Same score seen from player 2's side
    pub fn flipped(&self) -> Self {
        Self {
            player1_wins: self.player2_wins,
            player2_wins: self.player1_wins,
            draws: self.draws,
        }
    }
}

impl fmt::Display for GameScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.draws > 0 {
            write!(f, "{}-{}-{}", self.player1_wins, self.player2_wins, self.draws)
        } else {
            write!(f, "{}-{}", self.player1_wins, self.player2_wins)
        }
    }
}

/// Who confirmed a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "player", rename_all = "snake_case")]
pub enum ConfirmedBy {
    /// The player who did not report
    Opponent(PlayerId),
    /// Operator confirmation or override
    Operator,
    /// Unopposed match
    Bye,
}

/// Caller of a result mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "player", rename_all = "snake_case")]
pub enum Actor {
    Player(PlayerId),
    Operator,
}

/// Coarse result state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultState {
    Pending,
    Reported,
    Confirmed,
}

/// Result of a match: Pending -> Reported -> Confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchResult {
    Pending,
    Reported {
        score: GameScore,
        reported_by: PlayerId,
        reported_at: DateTime<Utc>,
    },
    Confirmed {
        score: GameScore,
        reported_by: Option<PlayerId>,
        confirmed_by: ConfirmedBy,
        confirmed_at: DateTime<Utc>,
    },
}

/// A single pairing within a draft round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    pub table: u32,
    pub player1: PlayerId,
    /// `None` for a bye
    pub player2: Option<PlayerId>,
    pub result: MatchResult,
}

impl Match {
    pub fn new(id: MatchId, round: u32, table: u32, player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            id,
            round,
            table,
            player1,
            player2: Some(player2),
            result: MatchResult::Pending,
        }
    }

    /// A bye is confirmed from the moment it exists
    pub fn bye(id: MatchId, round: u32, table: u32, player: PlayerId) -> Self {
        Self {
            id,
            round,
            table,
            player1: player,
            player2: None,
            result: MatchResult::Confirmed {
                score: GameScore::BYE,
                reported_by: None,
                confirmed_by: ConfirmedBy::Bye,
                confirmed_at: Utc::now(),
            },
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn state(&self) -> ResultState {
        match self.result {
            MatchResult::Pending => ResultState::Pending,
            MatchResult::Reported { .. } => ResultState::Reported,
            MatchResult::Confirmed { .. } => ResultState::Confirmed,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.state() == ResultState::Confirmed
    }

    /// Latest score, reported or confirmed
    pub fn score(&self) -> Option<GameScore> {
        match &self.result {
            MatchResult::Pending => None,
            MatchResult::Reported { score, .. } | MatchResult::Confirmed { score, .. } => {
                Some(*score)
            }
        }
    }

    /// Score that counts toward standings
    pub fn confirmed_score(&self) -> Option<GameScore> {
        match &self.result {
            MatchResult::Confirmed { score, .. } => Some(*score),
            _ => None,
        }
    }

    pub fn reported_by(&self) -> Option<PlayerId> {
        match &self.result {
            MatchResult::Pending => None,
            MatchResult::Reported { reported_by, .. } => Some(*reported_by),
            MatchResult::Confirmed { reported_by, .. } => *reported_by,
        }
    }

    pub fn confirmed_by(&self) -> Option<ConfirmedBy> {
        match &self.result {
            MatchResult::Confirmed { confirmed_by, .. } => Some(*confirmed_by),
            _ => None,
        }
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player1 == player || self.player2 == Some(player)
    }

    /// Opponent of `player`, `None` for a bye or a non-participant
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.player1 == player {
            self.player2
        } else if self.player2 == Some(player) {
            Some(self.player1)
        } else {
            None
        }
    }

    /// Latest score from `player`'s side
    pub fn score_for(&self, player: PlayerId) -> Option<GameScore> {
        let score = self.score()?;
        if self.player1 == player {
            Some(score)
        } else if self.player2 == Some(player) {
            Some(score.flipped())
        } else {
            None
        }
    }

    /// Winner by game count, `None` while pending or on a draw
    pub fn winner(&self) -> Option<PlayerId> {
        match self.score()?.outcome() {
            Outcome::Player1Win => Some(self.player1),
            Outcome::Player2Win => self.player2,
            Outcome::Draw => None,
        }
    }

    /// Record a participant's result claim
    pub fn report(&mut self, reporter: PlayerId, score: GameScore) -> DraftResult<()> {
        if !self.involves(reporter) {
            return Err(DraftError::NotAParticipant {
                player: reporter,
                match_id: self.id,
            });
        }

        if self.state() != ResultState::Pending {
            return Err(DraftError::AlreadyReported(self.id));
        }

        score.validate()?;

        self.result = MatchResult::Reported {
            score,
            reported_by: reporter,
            reported_at: Utc::now(),
        };

        Ok(())
    }

    /// Accept a reported result; only the non-reporting player or an operator may
    pub fn confirm(&mut self, actor: Actor) -> DraftResult<()> {
        let MatchResult::Reported {
            score, reported_by, ..
        } = self.result
        else {
            return Err(DraftError::NotReported(self.id));
        };

        let confirmed_by = match actor {
            Actor::Operator => ConfirmedBy::Operator,
            Actor::Player(player) => {
                if !self.involves(player) {
                    return Err(DraftError::NotAParticipant {
                        player,
                        match_id: self.id,
                    });
                }
                if player == reported_by {
                    return Err(DraftError::SelfConfirmation);
                }
                ConfirmedBy::Opponent(player)
            }
        };

        self.result = MatchResult::Confirmed {
            score,
            reported_by: Some(reported_by),
            confirmed_by,
            confirmed_at: Utc::now(),
        };

        Ok(())
    }

    /// Operator sets the score and confirms it in one step, from any state
    pub fn override_result(&mut self, score: GameScore) -> DraftResult<()> {
        if self.is_bye() {
            return Err(DraftError::invalid(
                "override result",
                format!("match {} is a bye", self.id),
            ));
        }

        score.validate()?;

        self.result = MatchResult::Confirmed {
            score,
            reported_by: None,
            confirmed_by: ConfirmedBy::Operator,
            confirmed_at: Utc::now(),
        };

        Ok(())
    }

    /// Human-readable result: "Pending", "2-1 (awaiting confirmation)", "2-1 (confirmed)"
    pub fn display_result(&self) -> String {
        display_score(self.score(), self.state())
    }

    /// Like [`Match::display_result`] but from `player`'s side
    pub fn display_result_for(&self, player: PlayerId) -> String {
        display_score(self.score_for(player), self.state())
    }
}

fn display_score(score: Option<GameScore>, state: ResultState) -> String {
    match (score, state) {
        (Some(score), ResultState::Reported) => format!("{score} (awaiting confirmation)"),
        (Some(score), ResultState::Confirmed) => format!("{score} (confirmed)"),
        _ => "Pending".to_string(),
    }
}

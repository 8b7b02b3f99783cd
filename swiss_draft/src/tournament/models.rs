//! Tournament data models: players, the draft schedule and draft configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tournament ID type
pub type TournamentId = i64;

/// Draft ID type
pub type DraftId = i64;

/// Player ID type
pub type PlayerId = i64;

/// Default number of Swiss rounds played in one draft
pub const DEFAULT_ROUNDS_PER_DRAFT: u32 = 3;

/// Upper bound on rounds per draft
pub const MAX_ROUNDS_PER_DRAFT: u32 = 8;

/// Upper bound on draft phases in one tournament
pub const MAX_PHASE: u32 = 64;

/// Display-only pronoun choice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pronouns {
    #[serde(rename = "x")]
    TheyThem,
    #[serde(rename = "m")]
    HeHim,
    #[serde(rename = "f")]
    SheHer,
    #[default]
    #[serde(rename = "n")]
    Unspecified,
}

impl Pronouns {
    /// Label shown next to an opponent's name
    pub fn label(&self) -> &'static str {
        match self {
            Pronouns::TheyThem => "(they/them)",
            Pronouns::HeHim => "(he/him)",
            Pronouns::SheHer => "(she/her)",
            Pronouns::Unspecified => "(neither/don't want to say)",
        }
    }
}

/// A tournament participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub pronouns: Pronouns,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, pronouns: Pronouns) -> Self {
        Self {
            id,
            name: name.into(),
            pronouns,
        }
    }
}

/// Configuration for scheduling a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Card pool the draft is played with
    pub cube: String,
    /// Position in the tournament schedule (1-indexed)
    pub phase: u32,
    /// Number of Swiss rounds
    pub rounds: u32,
    /// Players seated at this draft
    pub players: Vec<PlayerId>,
    /// Fixed seed for seating and first-round order
    pub pairing_seed: Option<u64>,
}

impl DraftConfig {
    /// Create a draft configuration with the default round count
    pub fn new(cube: impl Into<String>, phase: u32, players: Vec<PlayerId>) -> Self {
        Self {
            cube: cube.into(),
            phase,
            rounds: DEFAULT_ROUNDS_PER_DRAFT,
            players,
            pairing_seed: None,
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.pairing_seed = Some(seed);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cube.trim().is_empty() {
            return Err("Cube name must not be empty".to_string());
        }

        if self.phase == 0 || self.phase > MAX_PHASE {
            return Err(format!("Phase must be between 1 and {MAX_PHASE}"));
        }

        if self.rounds == 0 || self.rounds > MAX_ROUNDS_PER_DRAFT {
            return Err(format!(
                "Rounds must be between 1 and {MAX_ROUNDS_PER_DRAFT}"
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.players.iter().find(|id| !seen.insert(**id)) {
            return Err(format!("Player {dup} is listed twice"));
        }

        Ok(())
    }
}

/// Tournament round span covered by draft rounds `1..=rounds` in `phase`
///
/// Saturates rather than wrapping for out-of-range stored phases.
pub fn tournament_round_span(phase: u32, rounds: u32) -> (u32, u32) {
    let first = phase.saturating_sub(1).saturating_mul(rounds).saturating_add(1);
    (first, first.saturating_add(rounds.saturating_sub(1)))
}

/// Schedule entry for a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDraft {
    pub id: DraftId,
    pub cube: String,
    pub phase: u32,
    pub rounds: u32,
    pub players: Vec<PlayerId>,
}

/// Tournament registry: enrolled players, the draft schedule and the event round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Tournament-level round counter, 0 before any draft is paired
    pub event_round: u32,
    pub players: Vec<Player>,
    pub schedule: Vec<ScheduledDraft>,
    pub created_at: DateTime<Utc>,
    next_player_id: PlayerId,
    next_draft_id: DraftId,
}

impl Tournament {
    pub fn new(id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            event_round: 0,
            players: Vec::new(),
            schedule: Vec::new(),
            created_at: Utc::now(),
            next_player_id: 1,
            next_draft_id: 1,
        }
    }

    /// Enroll a player and return the new ID
    pub fn enroll(&mut self, name: impl Into<String>, pronouns: Pronouns) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.push(Player::new(id, name, pronouns));
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Reserve the next draft ID
    pub fn allocate_draft_id(&mut self) -> DraftId {
        let id = self.next_draft_id;
        self.next_draft_id += 1;
        id
    }

    /// Drafts scheduled before `phase`
    pub fn drafts_before(&self, phase: u32) -> impl Iterator<Item = &ScheduledDraft> {
        self.schedule.iter().filter(move |d| d.phase < phase)
    }

    /// Whether `player` already sits in a draft of `phase`
    pub fn is_scheduled_in_phase(&self, player: PlayerId, phase: u32) -> bool {
        self.schedule
            .iter()
            .any(|d| d.phase == phase && d.players.contains(&player))
    }

    /// Timetable of drafts a player is scheduled for, in schedule order
    pub fn timetable(&self, player: PlayerId) -> Vec<TimetableEntry> {
        let mut entries: Vec<TimetableEntry> = self
            .schedule
            .iter()
            .filter(|d| d.players.contains(&player))
            .map(|d| {
                let (first_round, last_round) = tournament_round_span(d.phase, d.rounds);
                TimetableEntry {
                    draft_id: d.id,
                    cube: d.cube.clone(),
                    phase: d.phase,
                    round_number: d.rounds,
                    first_round,
                    last_round,
                }
            })
            .collect();
        entries.sort_by_key(|e| (e.phase, e.draft_id));
        entries
    }
}

/// One row of a player's timetable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub draft_id: DraftId,
    pub cube: String,
    pub phase: u32,
    pub round_number: u32,
    pub first_round: u32,
    pub last_round: u32,
}

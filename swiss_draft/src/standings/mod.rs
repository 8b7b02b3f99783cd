//! Swiss standings: match points and the MW%/GW%/OMW%/OGW% tiebreakers.
//!
//! Standings are a pure function of the confirmed match history. Reported but
//! unconfirmed results never move a player's record.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::draft::matches::{Match, Outcome};
use crate::tournament::models::PlayerId;

/// Match points for a win (byes included)
pub const POINTS_PER_WIN: u32 = 3;

/// Match points for a draw
pub const POINTS_PER_DRAW: u32 = 1;

/// Lower bound applied to every percentage
pub const PERCENTAGE_FLOOR: f64 = 1.0 / 3.0;

/// One player's line in the standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRecord {
    pub player: PlayerId,
    pub points: u32,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub byes: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_drawn: u32,
    /// Match-win percentage
    pub mwp: f64,
    /// Game-win percentage
    pub gwp: f64,
    /// Opponents' average match-win percentage
    pub omwp: f64,
    /// Opponents' average game-win percentage
    pub ogwp: f64,
}

#[derive(Debug, Default, Clone)]
struct Tally {
    points: u32,
    matches: u32,
    wins: u32,
    losses: u32,
    draws: u32,
    byes: u32,
    games_won: u32,
    games_lost: u32,
    games_drawn: u32,
    // Same counts with byes left out, used when this player is someone's opponent
    unbye_points: u32,
    unbye_matches: u32,
    unbye_games_won: u32,
    unbye_games_played: u32,
    opponents: Vec<PlayerId>,
}

impl Tally {
    fn record(&mut self, own: u8, other: u8, drawn: u8, outcome: Ordering, bye: bool) {
        let points = match outcome {
            Ordering::Greater => {
                self.wins += 1;
                POINTS_PER_WIN
            }
            Ordering::Equal => {
                self.draws += 1;
                POINTS_PER_DRAW
            }
            Ordering::Less => {
                self.losses += 1;
                0
            }
        };

        self.points += points;
        self.matches += 1;
        self.games_won += u32::from(own);
        self.games_lost += u32::from(other);
        self.games_drawn += u32::from(drawn);

        if bye {
            self.byes += 1;
        } else {
            self.unbye_points += points;
            self.unbye_matches += 1;
            self.unbye_games_won += u32::from(own);
            self.unbye_games_played += u32::from(own) + u32::from(other) + u32::from(drawn);
        }
    }

    fn mwp(&self) -> f64 {
        floored_ratio(self.points, POINTS_PER_WIN * self.matches)
    }

    fn gwp(&self) -> f64 {
        floored_ratio(
            self.games_won,
            self.games_won + self.games_lost + self.games_drawn,
        )
    }

    fn opponent_mwp(&self) -> f64 {
        floored_ratio(self.unbye_points, POINTS_PER_WIN * self.unbye_matches)
    }

    fn opponent_gwp(&self) -> f64 {
        floored_ratio(self.unbye_games_won, self.unbye_games_played)
    }
}

fn floored_ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return PERCENTAGE_FLOOR;
    }
    (f64::from(numerator) / f64::from(denominator)).max(PERCENTAGE_FLOOR)
}

fn mean_or_floor(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        PERCENTAGE_FLOOR
    } else {
        sum / f64::from(count)
    }
}

/// Compute ranked standings for `players` from `matches`.
///
/// `players` is the seating order; it breaks ties left after every
/// tiebreaker. Only confirmed matches are counted. Players who appear in
/// matches but not in `players` still count as opponents but get no line.
pub fn compute_standings<'a>(
    players: &[PlayerId],
    matches: impl IntoIterator<Item = &'a Match>,
) -> Vec<StandingsRecord> {
    let mut tallies: HashMap<PlayerId, Tally> = players
        .iter()
        .map(|&id| (id, Tally::default()))
        .collect();

    for m in matches {
        let Some(score) = m.confirmed_score() else {
            continue;
        };

        match m.player2 {
            None => {
                tallies.entry(m.player1).or_default().record(
                    score.player1_wins,
                    score.player2_wins,
                    score.draws,
                    Ordering::Greater,
                    true,
                );
            }
            Some(player2) => {
                let outcome = match score.outcome() {
                    Outcome::Player1Win => Ordering::Greater,
                    Outcome::Player2Win => Ordering::Less,
                    Outcome::Draw => Ordering::Equal,
                };

                let t1 = tallies.entry(m.player1).or_default();
                t1.record(
                    score.player1_wins,
                    score.player2_wins,
                    score.draws,
                    outcome,
                    false,
                );
                t1.opponents.push(player2);

                let t2 = tallies.entry(player2).or_default();
                t2.record(
                    score.player2_wins,
                    score.player1_wins,
                    score.draws,
                    outcome.reverse(),
                    false,
                );
                t2.opponents.push(m.player1);
            }
        }
    }

    let mut records: Vec<(usize, StandingsRecord)> = players
        .iter()
        .enumerate()
        .filter_map(|(seat, id)| {
            let tally = tallies.get(id)?;
            let opponents = || tally.opponents.iter().filter_map(|o| tallies.get(o));

            Some((
                seat,
                StandingsRecord {
                    player: *id,
                    points: tally.points,
                    matches_played: tally.matches,
                    wins: tally.wins,
                    losses: tally.losses,
                    draws: tally.draws,
                    byes: tally.byes,
                    games_won: tally.games_won,
                    games_lost: tally.games_lost,
                    games_drawn: tally.games_drawn,
                    mwp: tally.mwp(),
                    gwp: tally.gwp(),
                    omwp: mean_or_floor(opponents().map(Tally::opponent_mwp)),
                    ogwp: mean_or_floor(opponents().map(Tally::opponent_gwp)),
                },
            ))
        })
        .collect();

    // Duplicate roster entries keep only the first seat
    let mut seen = std::collections::HashSet::new();
    records.retain(|(_, r)| seen.insert(r.player));

    records.sort_by(|(seat_a, a), (seat_b, b)| compare_records(a, b).then(seat_a.cmp(seat_b)));
    records.into_iter().map(|(_, r)| r).collect()
}

/// Ranking order: points, OMW%, GW%, OGW%, all descending
pub fn compare_records(a: &StandingsRecord, b: &StandingsRecord) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.omwp.total_cmp(&a.omwp))
        .then_with(|| b.gwp.total_cmp(&a.gwp))
        .then_with(|| b.ogwp.total_cmp(&a.ogwp))
}

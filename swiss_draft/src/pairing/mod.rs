//! Swiss pairing engine.
//!
//! Players arrive in rank order. The top unpaired player takes the nearest
//! player below them they have not met yet, so an odd player out of a score
//! group slides down into the next group. When that greedy choice dead-ends
//! the search backtracks, trading partners until every player is matched or
//! the node budget runs out.

pub mod seating;

pub use seating::SeatRandomizer;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::draft::matches::Match;
use crate::tournament::models::PlayerId;

/// Default number of search nodes before a pairing attempt gives up
pub const DEFAULT_NODE_BUDGET: usize = 200_000;

/// Why a round could not be paired
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingConflict {
    #[error("{players} player(s) is not enough to pair a round")]
    NotEnoughPlayers { players: usize },

    #[error("round {round} needs a bye but every player has already had one")]
    NoByeCandidate { round: u32 },

    #[error("round {round} cannot be paired without a rematch")]
    NoValidPairing { round: u32 },

    #[error("round {round} pairing search gave up after {budget} nodes")]
    SearchExhausted { round: u32, budget: usize },
}

/// Who has already played whom, and who has had a bye, within one draft
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingHistory {
    pairs: HashSet<(PlayerId, PlayerId)>,
    byes: HashSet<PlayerId>,
}

fn ordered(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl PairingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build history from every match of the draft, whatever its result state
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut history = Self::new();
        for m in matches {
            match m.player2 {
                Some(p2) => history.record_pair(m.player1, p2),
                None => history.record_bye(m.player1),
            }
        }
        history
    }

    pub fn record_pair(&mut self, a: PlayerId, b: PlayerId) {
        self.pairs.insert(ordered(a, b));
    }

    pub fn record_bye(&mut self, player: PlayerId) {
        self.byes.insert(player);
    }

    pub fn have_played(&self, a: PlayerId, b: PlayerId) -> bool {
        self.pairs.contains(&ordered(a, b))
    }

    pub fn had_bye(&self, player: PlayerId) -> bool {
        self.byes.contains(&player)
    }
}

/// A player in pairing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub id: PlayerId,
    pub points: u32,
}

/// One table of a pairing plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub table: u32,
    /// Higher-ranked player
    pub player1: PlayerId,
    pub player2: PlayerId,
}

/// Output of the engine for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingPlan {
    pub round: u32,
    /// Tables numbered from 1 in rank order
    pub pairings: Vec<Pairing>,
    pub bye: Option<PlayerId>,
    /// Players paired against someone from a lower score group
    pub downfloats: Vec<PlayerId>,
}

impl PairingPlan {
    /// Table number a bye is recorded at
    pub fn bye_table(&self) -> u32 {
        self.pairings.len() as u32 + 1
    }
}

/// Swiss pairing engine
#[derive(Debug, Clone, Copy)]
pub struct PairingEngine {
    node_budget: usize,
}

impl Default for PairingEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct BudgetExhausted;

struct Search<'a> {
    players: &'a [RankedPlayer],
    history: &'a PairingHistory,
    used: Vec<bool>,
    pairs: Vec<(usize, usize)>,
    nodes: usize,
    budget: usize,
}

impl Search<'_> {
    fn solve(&mut self) -> Result<bool, BudgetExhausted> {
        let Some(top) = self.used.iter().position(|used| !used) else {
            return Ok(true);
        };

        self.nodes += 1;
        if self.nodes > self.budget {
            return Err(BudgetExhausted);
        }

        self.used[top] = true;
        for partner in top + 1..self.players.len() {
            if self.used[partner]
                || self
                    .history
                    .have_played(self.players[top].id, self.players[partner].id)
            {
                continue;
            }

            self.used[partner] = true;
            self.pairs.push((top, partner));
            if self.solve()? {
                return Ok(true);
            }
            self.pairs.pop();
            self.used[partner] = false;
        }
        self.used[top] = false;

        Ok(false)
    }
}

impl PairingEngine {
    pub fn new() -> Self {
        Self {
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }

    pub fn with_node_budget(node_budget: usize) -> Self {
        Self { node_budget }
    }

    pub fn node_budget(&self) -> usize {
        self.node_budget
    }

    /// Pair `ranked` (best first) for `round`, avoiding rematches and repeat byes
    pub fn pair(
        &self,
        round: u32,
        ranked: &[RankedPlayer],
        history: &PairingHistory,
    ) -> Result<PairingPlan, PairingConflict> {
        if ranked.is_empty() {
            return Err(PairingConflict::NotEnoughPlayers { players: 0 });
        }

        let mut search = Search {
            players: ranked,
            history,
            used: vec![false; ranked.len()],
            pairs: Vec::with_capacity(ranked.len() / 2),
            nodes: 0,
            budget: self.node_budget,
        };

        if ranked.len() % 2 == 0 {
            return match search.solve() {
                Ok(true) => Ok(self.plan(round, &search, None)),
                Ok(false) => Err(PairingConflict::NoValidPairing { round }),
                Err(BudgetExhausted) => Err(PairingConflict::SearchExhausted {
                    round,
                    budget: self.node_budget,
                }),
            };
        }

        // Lowest-ranked player without a bye first, moving up on failure
        let candidates: Vec<usize> = (0..ranked.len())
            .rev()
            .filter(|&idx| !history.had_bye(ranked[idx].id))
            .collect();

        if candidates.is_empty() {
            return Err(PairingConflict::NoByeCandidate { round });
        }

        for candidate in candidates {
            search.used.iter_mut().for_each(|used| *used = false);
            search.pairs.clear();
            search.used[candidate] = true;

            match search.solve() {
                Ok(true) => return Ok(self.plan(round, &search, Some(ranked[candidate].id))),
                Ok(false) => continue,
                Err(BudgetExhausted) => {
                    return Err(PairingConflict::SearchExhausted {
                        round,
                        budget: self.node_budget,
                    });
                }
            }
        }

        Err(PairingConflict::NoValidPairing { round })
    }

    fn plan(&self, round: u32, search: &Search<'_>, bye: Option<PlayerId>) -> PairingPlan {
        let players = search.players;
        let mut pairings = Vec::with_capacity(search.pairs.len());
        let mut downfloats = Vec::new();

        for (table, &(a, b)) in search.pairs.iter().enumerate() {
            if players[a].points > players[b].points {
                downfloats.push(players[a].id);
            }
            pairings.push(Pairing {
                table: table as u32 + 1,
                player1: players[a].id,
                player2: players[b].id,
            });
        }

        log::debug!(
            "Paired round {} in {} node(s): {} table(s), bye {:?}",
            round,
            search.nodes,
            pairings.len(),
            bye
        );

        PairingPlan {
            round,
            pairings,
            bye,
            downfloats,
        }
    }
}

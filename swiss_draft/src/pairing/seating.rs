//! Seat randomization and the first-round pairing order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::tournament::models::PlayerId;

/// Randomizer for seats and round-one order.
///
/// A seeded randomizer reproduces the same seating and first-round pairings,
/// which tests and replayed events rely on.
pub struct SeatRandomizer {
    rng: StdRng,
}

impl SeatRandomizer {
    /// Create a randomizer seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a reproducible randomizer
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Randomizer for one step of a draft: seating is step 0, pairing round
    /// `k` is step `k`.
    ///
    /// With a seed the stream depends only on `seed` and `step`, so a draft
    /// reloaded between seating and pairing draws the same order. Without a
    /// seed it is OS-seeded.
    pub fn for_step(seed: Option<u64>, step: u64) -> Self {
        seed.map(|seed| Self::seeded(seed ^ step)).unwrap_or_default()
    }

    /// Assign seats 1..=n in random order
    ///
    /// Returns `(player, seat)` pairs sorted by seat.
    pub fn assign_seats(&mut self, players: &[PlayerId]) -> Vec<(PlayerId, u32)> {
        self.shuffle_order(players)
            .into_iter()
            .enumerate()
            .map(|(idx, player)| (player, idx as u32 + 1))
            .collect()
    }

    /// Random order used to pair the first round
    pub fn shuffle_order(&mut self, players: &[PlayerId]) -> Vec<PlayerId> {
        let mut order = players.to_vec();
        order.shuffle(&mut self.rng);
        order
    }
}

impl Default for SeatRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SeatRandomizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeatRandomizer").finish_non_exhaustive()
    }
}

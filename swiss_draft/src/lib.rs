//! # Swiss Draft
//!
//! Engine for Swiss-style tournaments made of one or more card drafts.
//!
//! Each draft seats its players, then plays a fixed number of Swiss rounds.
//! A round is paired from the current standings, results go through a
//! report-then-confirm protocol, and the round can only finish once every
//! result is confirmed.
//!
//! ## Core Modules
//!
//! - [`standings`]: points and the MW%/GW%/OMW%/OGW% tiebreakers
//! - [`pairing`]: Swiss pairing with rematch avoidance and bye rules
//! - [`draft`]: match result protocol, the draft state machine and its actor
//! - [`tournament`]: player registry, draft schedule and the manager
//! - [`status`]: read-only projections for dashboards
//! - [`db`]: snapshot repositories (in-memory and PostgreSQL)
//!
//! ## Example
//!
//! ```
//! use swiss_draft::draft::{Actor, GameScore, Match};
//! use swiss_draft::standings::compute_standings;
//!
//! let mut m = Match::new(1, 1, 1, 10, 20);
//! m.report(10, GameScore::new(2, 1)).unwrap();
//! m.confirm(Actor::Player(20)).unwrap();
//!
//! let standings = compute_standings(&[10, 20], [&m]);
//! assert_eq!(standings[0].player, 10);
//! assert_eq!(standings[0].points, 3);
//! ```

/// Snapshot persistence.
pub mod db;

/// Draft aggregate, matches and the per-draft actor.
pub mod draft;
pub use draft::{Draft, DraftError, DraftResult};

/// Swiss pairing engine and seating.
pub mod pairing;
pub use pairing::{PairingConflict, PairingEngine};

/// Standings calculator.
pub mod standings;
pub use standings::{StandingsRecord, compute_standings};

/// Read-only status projections.
pub mod status;
pub use status::StatusService;

/// Tournament registry and manager.
pub mod tournament;
pub use tournament::TournamentManager;

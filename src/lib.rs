//! Skill ratings for competitors that meet in pairwise bouts.
//!
//! Four interchangeable rating algorithms (Elo, Glicko-1, ECF and DWZ)
//! share one capability set: expected score, win/loss/draw updates, reset,
//! and a portable state document. The [`LambdaArena`] drives many bouts at
//! once: it maps opaque identifiers to lazily-created competitors of a
//! configured variant, decides each bout through a caller-supplied oracle,
//! and logs every prediction so decision thresholds can be tuned against
//! the recorded [`History`] afterwards.
//!
//! # Example
//!
//! ```
//! use elote::{EloCompetitor, LambdaArena};
//!
//! let mut good = EloCompetitor::new(400.0)?;
//! let mut better = EloCompetitor::new(500.0)?;
//! better.beat(&mut good);
//! assert!(better.expected_score(&good) > 0.5);
//!
//! // Or let an arena manage the population: the oracle decides bouts.
//! let mut arena = LambdaArena::new(|a: &u32, b: &u32, _| Some(a > b));
//! arena.tournament((1..=8).zip(2..=9))?;
//! let board = arena.leaderboard();
//! assert_eq!(board.first().map(|entry| entry.competitor), Some(9));
//! # Ok::<(), elote::RatingError>(())
//! ```
//!
//! A single competitor or arena is not safe under concurrent mutation;
//! independent arenas may run on separate threads freely.

pub mod arena;
pub mod competitors;
pub mod error;
pub mod history;
pub mod numerical;
pub mod state;

pub use arena::{DrawPolicy, LambdaArena, LeaderboardEntry};
pub use competitors::{
    BlendedCompetitor, Competitor, CompetitorConfig, CompetitorKind, DwzCompetitor, DwzConfig,
    EcfCompetitor, EcfConfig, EloCompetitor, EloConfig, GlickoCompetitor, GlickoConfig,
};
pub use error::RatingError;
pub use history::{Bout, ConfusionMatrix, History, HistoryReport, Outcome, ThresholdSearch};
pub use state::StateDoc;

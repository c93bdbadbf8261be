//! Slide puzzle: answer tokens riding conveyors
//!
//! All puzzle logic lives here. Like the rest of the core it is
//! single-threaded and tick-driven:
//! - Seeded RNG only (challenges)
//! - Movement/recycling before spawning within a tick
//! - No rendering; visuals go through [`TokenHost`]

pub mod catalog;
pub mod challenge;
pub mod conveyor;
pub mod host;
pub mod slide;

pub use catalog::{Catalog, PieceTemplate};
pub use challenge::{Answer, AnswerSet, ChallengeGenerator, UnitFamily};
pub use conveyor::{ArrivalMode, Conveyor, ConveyorId, ConveyorLine, Token, TokenId, TokenIds};
pub use host::{RecordingHost, TokenHost};
pub use slide::{PuzzleEvent, PuzzlePhase, Selection, SlidePuzzle};

use thiserror::Error;

/// Puzzle configuration/usage errors. Tick paths log these and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    #[error("answer catalog is empty")]
    EmptyCatalog,
    #[error("puzzle has no usable conveyor lines")]
    NoConveyors,
    #[error("token {0:?} is not active on any conveyor")]
    UnknownToken(TokenId),
    #[error("puzzle has not been activated")]
    NotActivated,
    #[error("puzzle is not running")]
    NotRunning,
}

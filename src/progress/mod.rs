//! Stage progression
//!
//! Stages unlock once every prerequisite stage is cleared. The whole game is
//! complete when every stage is cleared.

pub mod stage;
pub mod world;

pub use stage::{SaveData, StageDefinition, StageNode, StageRecord, StageState};
pub use world::{GatingMode, ProgressEvent, StageWorld};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("stage '{0}' is defined twice")]
    DuplicateStage(String),
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
    #[error("stage '{stage}' requires unknown stage '{prerequisite}'")]
    UnknownPrerequisite { stage: String, prerequisite: String },
    #[error("stage '{0}' is locked")]
    StageLocked(String),
}

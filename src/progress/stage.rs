//! Stage nodes and their persisted form

use serde::{Deserialize, Serialize};

/// Registry entry: a stage and the stages it requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl StageDefinition {
    pub fn new(id: impl Into<String>, prerequisites: &[&str]) -> Self {
        Self {
            id: id.into(),
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Persisted progress for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: String,
    pub cleared: bool,
    #[serde(default)]
    pub losses: u32,
}

/// Persisted progress for the whole world
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub stages: Vec<StageRecord>,
}

impl SaveData {
    pub fn record(&self, id: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageState {
    Locked,
    Available,
    Cleared,
}

/// Runtime unlock state of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageNode {
    pub id: String,
    pub cleared: bool,
    pub available: bool,
    pub losses: u32,
    /// Indices of prerequisite nodes in the owning world
    pub(crate) prerequisites: Vec<usize>,
}

impl StageNode {
    /// Cleared wins over available
    pub fn state(&self) -> StageState {
        if self.cleared {
            StageState::Cleared
        } else if self.available {
            StageState::Available
        } else {
            StageState::Locked
        }
    }

    pub fn prerequisites(&self) -> &[usize] {
        &self.prerequisites
    }
}

//! Stage gating graph
//!
//! A stage is available when all of its prerequisites are cleared. Clearing
//! is driven externally by [`StageWorld::complete_stage`]; availability is
//! derived from it, either on every tick ([`GatingMode::Poll`]) or only when
//! a prerequisite clears ([`GatingMode::OnChange`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ProgressError;
use super::stage::{SaveData, StageDefinition, StageNode, StageRecord, StageState};
use crate::events::EventBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GatingMode {
    /// Re-derive every node's availability each tick. A stage whose
    /// prerequisites stop being cleared locks again.
    Poll,
    /// Recompute a stage only when one of its prerequisites clears.
    /// Availability is never revoked between loads.
    #[default]
    OnChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    StageUnlocked(String),
    StageRelocked(String),
    StageCleared(String),
    LossRecorded { stage: String, losses: u32 },
    /// Every stage is cleared. Fires once.
    GameComplete,
}

pub struct StageWorld {
    nodes: Vec<StageNode>,
    index: HashMap<String, usize>,
    /// Reverse edges: stages that list node `i` as a prerequisite
    dependents: Vec<Vec<usize>>,
    mode: GatingMode,
    complete_announced: bool,
    events: EventBus<ProgressEvent>,
}

impl StageWorld {
    /// Build the graph from the stage registry and saved progress.
    ///
    /// Save records for stages no longer in the registry are ignored. A world
    /// that is already complete at load does not announce completion again.
    pub fn load(
        registry: &[StageDefinition],
        save: &SaveData,
        mode: GatingMode,
    ) -> Result<Self, ProgressError> {
        let mut index = HashMap::with_capacity(registry.len());
        for (i, def) in registry.iter().enumerate() {
            if index.insert(def.id.clone(), i).is_some() {
                return Err(ProgressError::DuplicateStage(def.id.clone()));
            }
        }

        let mut nodes = Vec::with_capacity(registry.len());
        let mut dependents = vec![Vec::new(); registry.len()];
        for (i, def) in registry.iter().enumerate() {
            let mut prerequisites = Vec::with_capacity(def.prerequisites.len());
            for prereq in &def.prerequisites {
                let &p = index
                    .get(prereq)
                    .ok_or_else(|| ProgressError::UnknownPrerequisite {
                        stage: def.id.clone(),
                        prerequisite: prereq.clone(),
                    })?;
                prerequisites.push(p);
                dependents[p].push(i);
            }
            let record = save.record(&def.id);
            nodes.push(StageNode {
                id: def.id.clone(),
                cleared: record.is_some_and(|r| r.cleared),
                available: false,
                losses: record.map_or(0, |r| r.losses),
                prerequisites,
            });
        }

        for record in &save.stages {
            if !index.contains_key(&record.id) {
                log::warn!("Ignoring saved progress for unknown stage '{}'", record.id);
            }
        }

        let mut world = Self {
            nodes,
            index,
            dependents,
            mode,
            complete_announced: false,
            events: EventBus::new(),
        };
        for i in 0..world.nodes.len() {
            let available = world.prerequisites_cleared(i);
            world.nodes[i].available = available;
        }
        world.complete_announced = world.all_cleared();

        log::info!(
            "Loaded {} stages ({} cleared)",
            world.nodes.len(),
            world.nodes.iter().filter(|n| n.cleared).count()
        );
        Ok(world)
    }

    pub fn mode(&self) -> GatingMode {
        self.mode
    }

    pub fn events_mut(&mut self) -> &mut EventBus<ProgressEvent> {
        &mut self.events
    }

    pub fn nodes(&self) -> &[StageNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&StageNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn state(&self, id: &str) -> Option<StageState> {
        self.node(id).map(StageNode::state)
    }

    fn lookup(&self, id: &str) -> Result<usize, ProgressError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ProgressError::UnknownStage(id.to_string()))
    }

    fn prerequisites_cleared(&self, i: usize) -> bool {
        self.nodes[i]
            .prerequisites
            .iter()
            .all(|&p| self.nodes[p].cleared)
    }

    /// True when there is at least one stage and every stage is cleared
    pub fn all_cleared(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(|n| n.cleared)
    }

    /// Per-tick update: availability first, then the all-clear check
    pub fn tick(&mut self) {
        if self.mode == GatingMode::Poll {
            self.recompute_all();
        }

        if !self.complete_announced && self.all_cleared() {
            self.complete_announced = true;
            log::info!("All stages cleared");
            self.events.publish(&ProgressEvent::GameComplete);
        }
    }

    /// Re-derive every node's availability, publishing transitions in node order
    fn recompute_all(&mut self) {
        for i in 0..self.nodes.len() {
            let available = self.prerequisites_cleared(i);
            self.set_available(i, available);
        }
    }

    fn set_available(&mut self, i: usize, available: bool) {
        let node = &mut self.nodes[i];
        if node.available == available {
            return;
        }
        node.available = available;
        let event = if available {
            log::info!("Stage '{}' unlocked", node.id);
            ProgressEvent::StageUnlocked(node.id.clone())
        } else {
            log::info!("Stage '{}' locked again", node.id);
            ProgressEvent::StageRelocked(node.id.clone())
        };
        self.events.publish(&event);
    }

    /// Stage completion event. Clearing is permanent; repeats are no-ops.
    pub fn complete_stage(&mut self, id: &str) -> Result<(), ProgressError> {
        let i = self.lookup(id)?;
        if self.nodes[i].cleared {
            return Ok(());
        }
        self.nodes[i].cleared = true;
        log::info!("Stage '{}' cleared", id);
        self.events
            .publish(&ProgressEvent::StageCleared(id.to_string()));

        if self.mode == GatingMode::OnChange {
            for d in self.dependents[i].clone() {
                if !self.nodes[d].available && self.prerequisites_cleared(d) {
                    self.set_available(d, true);
                }
            }
        }
        Ok(())
    }

    /// Count a failed attempt. Returns the new loss count.
    pub fn record_loss(&mut self, id: &str) -> Result<u32, ProgressError> {
        let i = self.lookup(id)?;
        let node = &mut self.nodes[i];
        node.losses = node.losses.saturating_add(1);
        let losses = node.losses;
        log::info!("Stage '{}' lost ({} losses)", id, losses);
        self.events.publish(&ProgressEvent::LossRecorded {
            stage: id.to_string(),
            losses,
        });
        Ok(losses)
    }

    /// Replace cleared flags and loss counts from a save.
    ///
    /// Stages missing from `save` become uncleared. In [`GatingMode::OnChange`]
    /// availability is re-derived immediately; in [`GatingMode::Poll`] on the
    /// next tick.
    pub fn apply_save(&mut self, save: &SaveData) {
        for node in &mut self.nodes {
            let record = save.record(&node.id);
            node.cleared = record.is_some_and(|r| r.cleared);
            node.losses = record.map_or(0, |r| r.losses);
        }
        if self.mode == GatingMode::OnChange {
            self.recompute_all();
        }
        self.complete_announced = self.all_cleared();
    }

    /// Snapshot for persistence (availability is derived, not stored)
    pub fn to_save(&self) -> SaveData {
        SaveData {
            stages: self
                .nodes
                .iter()
                .map(|n| StageRecord {
                    id: n.id.clone(),
                    cleared: n.cleared,
                    losses: n.losses,
                })
                .collect(),
        }
    }
}

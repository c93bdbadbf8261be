//! Slide puzzle lifecycle
//!
//! Activation builds the catalog and pre-fills every conveyor; start/stop
//! only toggle ticking; ending tears everything down.

use serde::{Deserialize, Serialize};

use super::PuzzleError;
use super::catalog::Catalog;
use super::challenge::AnswerSet;
use super::conveyor::{Conveyor, ConveyorId, ConveyorLine, TokenId, TokenIds};
use super::host::TokenHost;
use crate::events::EventBus;
use crate::settings::PuzzleTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzlePhase {
    /// No catalog, no tokens
    Inactive,
    /// Catalog built and pools filled, not ticking
    Stopped,
    /// Conveyors spawning and moving
    Running,
}

/// Result of grabbing a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Correct,
    Wrong,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleEvent {
    Started,
    Stopped,
    Ended,
    TokenSelected {
        token: TokenId,
        conveyor: ConveyorId,
        selection: Selection,
    },
}

pub struct SlidePuzzle {
    lines: Vec<ConveyorLine>,
    tuning: PuzzleTuning,
    conveyors: Vec<Conveyor>,
    catalog: Catalog,
    ids: TokenIds,
    phase: PuzzlePhase,
    prompt: String,
    events: EventBus<PuzzleEvent>,
}

impl SlidePuzzle {
    /// Degenerate lines (start == end) are dropped with a warning
    pub fn new(lines: Vec<ConveyorLine>, tuning: PuzzleTuning) -> Self {
        let lines: Vec<ConveyorLine> = lines
            .into_iter()
            .filter(|line| {
                if line.is_degenerate() {
                    log::warn!("Ignoring conveyor line with identical anchors at {}", line.start);
                    false
                } else {
                    true
                }
            })
            .collect();

        Self {
            lines,
            tuning,
            conveyors: Vec::new(),
            catalog: Catalog::default(),
            ids: TokenIds::default(),
            phase: PuzzlePhase::Inactive,
            prompt: String::new(),
            events: EventBus::new(),
        }
    }

    pub fn phase(&self) -> PuzzlePhase {
        self.phase
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn conveyors(&self) -> &[Conveyor] {
        &self.conveyors
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tuning(&self) -> &PuzzleTuning {
        &self.tuning
    }

    pub fn events_mut(&mut self) -> &mut EventBus<PuzzleEvent> {
        &mut self.events
    }

    /// Build the catalog for `answers` and pre-fill every conveyor.
    ///
    /// A live puzzle is ended first (publishing [`PuzzleEvent::Ended`]). The
    /// puzzle is left stopped.
    pub fn activate(
        &mut self,
        answers: &AnswerSet,
        host: &mut dyn TokenHost,
    ) -> Result<(), PuzzleError> {
        self.end(host);

        if self.lines.is_empty() {
            return Err(PuzzleError::NoConveyors);
        }
        let catalog = Catalog::build(answers);
        if catalog.is_empty() {
            return Err(PuzzleError::EmptyCatalog);
        }

        let tuning = &self.tuning;
        let mut conveyors: Vec<Conveyor> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                Conveyor::new(
                    ConveyorId(i),
                    *line,
                    tuning.conveyor_speed,
                    tuning.spawn_interval,
                    tuning.arrival,
                )
            })
            .collect();
        catalog.distribute(&mut conveyors, &mut self.ids, host)?;

        log::info!(
            "Puzzle activated: '{}' ({} pieces, {} conveyors)",
            answers.prompt,
            catalog.len(),
            conveyors.len()
        );
        self.catalog = catalog;
        self.conveyors = conveyors;
        self.prompt = answers.prompt.clone();
        self.phase = PuzzlePhase::Stopped;
        Ok(())
    }

    /// Resume ticking. No-op if already running.
    pub fn start(&mut self) -> Result<(), PuzzleError> {
        match self.phase {
            PuzzlePhase::Inactive => Err(PuzzleError::NotActivated),
            PuzzlePhase::Running => Ok(()),
            PuzzlePhase::Stopped => {
                self.conveyors.iter_mut().for_each(Conveyor::activate);
                self.phase = PuzzlePhase::Running;
                self.events.publish(&PuzzleEvent::Started);
                Ok(())
            }
        }
    }

    /// Pause ticking, leaving tokens where they are. No-op unless running.
    pub fn stop(&mut self) {
        if self.phase == PuzzlePhase::Running {
            self.conveyors.iter_mut().for_each(Conveyor::deactivate);
            self.phase = PuzzlePhase::Stopped;
            self.events.publish(&PuzzleEvent::Stopped);
        }
    }

    /// Tear down every conveyor. Safe to call from any phase, any number of times.
    pub fn end(&mut self, host: &mut dyn TokenHost) {
        let was_active = self.phase != PuzzlePhase::Inactive;
        self.teardown(host);
        if was_active {
            log::info!("Puzzle ended: '{}'", self.prompt);
            self.events.publish(&PuzzleEvent::Ended);
        }
    }

    fn teardown(&mut self, host: &mut dyn TokenHost) {
        for conveyor in &mut self.conveyors {
            conveyor.deactivate();
            conveyor.teardown(host);
        }
        self.conveyors.clear();
        self.catalog = Catalog::default();
        self.phase = PuzzlePhase::Inactive;
    }

    /// Advance every conveyor by `dt` seconds
    pub fn tick(&mut self, dt: f32, host: &mut dyn TokenHost) {
        if self.phase != PuzzlePhase::Running {
            return;
        }
        for conveyor in &mut self.conveyors {
            conveyor.tick(dt, &self.catalog, &mut self.ids, host);
        }
    }

    /// The player grabbed `token`. It goes back into its conveyor's pool.
    pub fn select_token(&mut self, token: TokenId) -> Result<Selection, PuzzleError> {
        if self.phase != PuzzlePhase::Running {
            return Err(PuzzleError::NotRunning);
        }

        let (conveyor, template) = self
            .conveyors
            .iter_mut()
            .find_map(|c| c.recycle(token).map(|template| (c.id, template)))
            .ok_or(PuzzleError::UnknownToken(token))?;

        let selection = match self.catalog.get(template) {
            Some(piece) if piece.correct => Selection::Correct,
            _ => Selection::Wrong,
        };
        log::debug!("Selected {:?} on {:?}: {:?}", token, conveyor, selection);
        self.events.publish(&PuzzleEvent::TokenSelected {
            token,
            conveyor,
            selection,
        });
        Ok(selection)
    }

    /// Active token carrying the correct answer, oldest first
    pub fn find_correct_token(&self) -> Option<TokenId> {
        let correct = self.catalog.correct_template()?;
        self.conveyors
            .iter()
            .flat_map(|c| c.active())
            .find(|t| t.template == correct)
            .map(|t| t.id)
    }

    /// Tokens currently owned by the puzzle (pooled + active)
    pub fn total_tokens(&self) -> usize {
        self.conveyors.iter().map(Conveyor::total_tokens).sum()
    }
}

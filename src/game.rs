//! Composition root
//!
//! Owns every subsystem once and drives them from a single per-frame tick:
//! puzzle first, then the stage graph (availability, then all-clear).

use thiserror::Error;

use crate::calculator::Calculator;
use crate::consts::MAX_FRAME_DT;
use crate::persistence::{self, PROGRESS_KEY, PersistenceError, SaveStore};
use crate::progress::{ProgressError, SaveData, StageDefinition, StageState, StageWorld};
use crate::puzzle::{
    ChallengeGenerator, ConveyorLine, PuzzleError, Selection, SlidePuzzle, TokenHost, TokenId,
};
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("no stage is in progress")]
    NoSession,
}

/// Progress through the stage currently being played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSession {
    pub stage: String,
    pub correct: u32,
    pub misses: u32,
}

/// What a token pick did to the running stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Wrong pick, stage continues
    Miss,
    /// Right pick, a fresh challenge is on the conveyors
    NextChallenge,
    StageCleared,
    StageLost,
}

pub struct Game {
    settings: Settings,
    puzzle: SlidePuzzle,
    world: StageWorld,
    calculator: Calculator,
    challenges: ChallengeGenerator,
    session: Option<StageSession>,
}

impl Game {
    pub fn new(
        settings: Settings,
        lines: Vec<ConveyorLine>,
        registry: &[StageDefinition],
        save: &SaveData,
        seed: u64,
    ) -> Result<Self, GameError> {
        let world = StageWorld::load(registry, save, settings.progress.gating)?;
        let puzzle = SlidePuzzle::new(lines, settings.puzzle.clone());
        let calculator = Calculator::new(&settings.calculator);
        Ok(Self {
            settings,
            puzzle,
            world,
            calculator,
            challenges: ChallengeGenerator::new(seed),
            session: None,
        })
    }

    /// Build from settings and progress found in `store`.
    /// Unreadable progress falls back to the store's backup, then to a fresh world.
    pub fn load(
        store: &dyn SaveStore,
        lines: Vec<ConveyorLine>,
        registry: &[StageDefinition],
        seed: u64,
    ) -> Result<Self, GameError> {
        let settings = Settings::load(store);
        let save = match persistence::load_or_recover::<SaveData>(store, PROGRESS_KEY) {
            Ok(save) => save.unwrap_or_default(),
            Err(e) => {
                log::warn!("Progress unreadable ({}), starting fresh", e);
                SaveData::default()
            }
        };
        Self::new(settings, lines, registry, &save, seed)
    }

    pub fn save(&self, store: &mut dyn SaveStore) -> Result<(), GameError> {
        persistence::save(store, PROGRESS_KEY, &self.world.to_save())?;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn puzzle(&self) -> &SlidePuzzle {
        &self.puzzle
    }

    pub fn puzzle_mut(&mut self) -> &mut SlidePuzzle {
        &mut self.puzzle
    }

    pub fn world(&self) -> &StageWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut StageWorld {
        &mut self.world
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut Calculator {
        &mut self.calculator
    }

    pub fn session(&self) -> Option<&StageSession> {
        self.session.as_ref()
    }

    /// Start playing `stage`. Cleared stages may be replayed; locked ones may not.
    pub fn enter_stage(&mut self, stage: &str, host: &mut dyn TokenHost) -> Result<(), GameError> {
        let state = self
            .world
            .state(stage)
            .ok_or_else(|| ProgressError::UnknownStage(stage.to_string()))?;
        if state == StageState::Locked {
            return Err(ProgressError::StageLocked(stage.to_string()).into());
        }

        self.leave_stage(host);
        self.roll_challenge(host)?;
        self.session = Some(StageSession {
            stage: stage.to_string(),
            correct: 0,
            misses: 0,
        });
        log::info!("Entered stage '{}'", stage);
        Ok(())
    }

    /// Abandon the current stage, if any
    pub fn leave_stage(&mut self, host: &mut dyn TokenHost) {
        self.puzzle.end(host);
        self.session = None;
    }

    fn roll_challenge(&mut self, host: &mut dyn TokenHost) -> Result<(), GameError> {
        let answers = self
            .challenges
            .next_challenge(self.settings.puzzle.distractors);
        self.puzzle.activate(&answers, host)?;
        self.puzzle.start()?;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.puzzle.stop();
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        if self.session.is_none() {
            return Err(GameError::NoSession);
        }
        self.puzzle.start()?;
        Ok(())
    }

    /// One frame. Negative deltas are ignored, large ones clamped.
    pub fn tick(&mut self, dt: f32, host: &mut dyn TokenHost) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.puzzle.tick(dt, host);
        self.world.tick();
    }

    /// The player grabbed `token` off a conveyor
    pub fn select_token(
        &mut self,
        token: TokenId,
        host: &mut dyn TokenHost,
    ) -> Result<SessionOutcome, GameError> {
        let Some(session) = self.session.as_mut() else {
            return Err(GameError::NoSession);
        };
        let tuning = &self.settings.puzzle;

        match self.puzzle.select_token(token)? {
            Selection::Correct => {
                session.correct += 1;
                if session.correct >= tuning.correct_to_clear {
                    let stage = session.stage.clone();
                    self.world.complete_stage(&stage)?;
                    self.leave_stage(host);
                    Ok(SessionOutcome::StageCleared)
                } else {
                    self.roll_challenge(host)?;
                    Ok(SessionOutcome::NextChallenge)
                }
            }
            Selection::Wrong => {
                session.misses += 1;
                if session.misses >= tuning.misses_to_fail {
                    let stage = session.stage.clone();
                    self.world.record_loss(&stage)?;
                    self.leave_stage(host);
                    Ok(SessionOutcome::StageLost)
                } else {
                    Ok(SessionOutcome::Miss)
                }
            }
        }
    }
}

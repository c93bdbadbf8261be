//! Game settings and tuning
//!
//! Persisted separately from stage progress, under its own storage key.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError, SETTINGS_KEY, SaveStore};
use crate::progress::GatingMode;
use crate::puzzle::ArrivalMode;

/// Conveyor and stage-session tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleTuning {
    /// Token travel speed (units/s)
    pub conveyor_speed: f32,
    /// Seconds between token spawns on each conveyor
    pub spawn_interval: f32,
    /// Arrival test for travelling tokens
    pub arrival: ArrivalMode,
    /// Wrong answers generated per challenge
    pub distractors: usize,
    /// Correct picks needed to clear a stage
    pub correct_to_clear: u32,
    /// Wrong picks that lose a stage
    pub misses_to_fail: u32,
}

impl Default for PuzzleTuning {
    fn default() -> Self {
        Self {
            conveyor_speed: 120.0,
            spawn_interval: 1.5,
            arrival: ArrivalMode::Clamped,
            distractors: 3,
            correct_to_clear: 3,
            misses_to_fail: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressTuning {
    /// How stage availability is recomputed
    pub gating: GatingMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorTuning {
    /// Longest expression the display accepts
    pub max_display_len: usize,
}

impl Default for CalculatorTuning {
    fn default() -> Self {
        Self {
            max_display_len: 12,
        }
    }
}

/// All settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub puzzle: PuzzleTuning,
    pub progress: ProgressTuning,
    pub calculator: CalculatorTuning,
}

impl Settings {
    /// Load settings from `store`, falling back to defaults
    pub fn load(store: &dyn SaveStore) -> Self {
        match persistence::load::<Settings>(store, SETTINGS_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn SaveStore) -> Result<(), PersistenceError> {
        persistence::save(store, SETTINGS_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_load_defaults_when_missing() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.puzzle.arrival = ArrivalMode::Exact;
        settings.progress.gating = GatingMode::Poll;
        settings.calculator.max_display_len = 20;
        settings.save(&mut store).unwrap();

        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut store = MemoryStore::new();
        store
            .write(
                SETTINGS_KEY,
                r#"{"version": 1, "payload": {"puzzle": {"spawn_interval": 0.5}}}"#,
            )
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.puzzle.spawn_interval, 0.5);
        assert_eq!(settings.puzzle.conveyor_speed, 120.0);
        assert_eq!(settings.calculator, CalculatorTuning::default());
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut store = MemoryStore::new();
        store.write(SETTINGS_KEY, "garbage").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }
}

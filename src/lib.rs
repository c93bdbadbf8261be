//! Meteor Strike - puzzle and progression engine
//!
//! Core modules:
//! - `puzzle`: Conversion challenges, answer catalog, token conveyors
//! - `progress`: Stage gating graph and whole-game completion
//! - `calculator`: In-game calculator (editing + arithmetic evaluation)
//! - `events`: Typed publish/subscribe hooks
//! - `persistence`: Versioned save envelope and storage backends
//! - `settings`: Data-driven tuning
//! - `game`: Composition root wiring everything together

pub mod calculator;
pub mod events;
pub mod game;
pub mod persistence;
pub mod progress;
pub mod puzzle;
pub mod settings;

pub use calculator::{Calculator, EvalError};
pub use events::{EventBus, SubscriptionId};
pub use game::Game;
pub use settings::Settings;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Simulation timestep the native driver uses (60 Hz, one tick per frame)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest delta a single tick accepts (spiral-of-death guard)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Decimal places kept when formatting numeric results
    pub const RESULT_DECIMALS: i32 = 10;
    /// Magnitude above which results are no longer shown
    pub const RESULT_MAX_MAGNITUDE: f64 = 1e15;
}

/// Move `current` toward `target` by at most `max_delta`, landing exactly on
/// `target` when the step would reach or pass it.
#[inline]
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let to_target = target - current;
    let dist = to_target.length();
    if dist <= max_delta || dist == 0.0 {
        return target;
    }
    current + to_target / dist * max_delta
}

/// Format a number for display: integral values without a fractional part,
/// everything else trimmed to [`consts::RESULT_DECIMALS`] places.
///
/// Returns `None` for non-finite or oversized values.
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() || value.abs() >= consts::RESULT_MAX_MAGNITUDE {
        return None;
    }
    let scale = 10f64.powi(consts::RESULT_DECIMALS);
    let mut rounded = (value * scale).round() / scale;
    // Avoid "-0"
    if rounded == 0.0 {
        rounded = 0.0;
    }
    Some(format!("{}", rounded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_clamps_on_arrival() {
        let from = Vec3::ZERO;
        let to = Vec3::new(3.0, 0.0, 0.0);
        assert_eq!(move_towards(from, to, 5.0), to);
        let mid = move_towards(from, to, 1.0);
        assert!((mid.x - 1.0).abs() < 1e-6);
        assert_eq!(move_towards(to, to, 1.0), to);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0).as_deref(), Some("4"));
        assert_eq!(format_number(2.5).as_deref(), Some("2.5"));
        assert_eq!(format_number(0.1 + 0.2).as_deref(), Some("0.3"));
        assert_eq!(format_number(-0.0).as_deref(), Some("0"));
        assert_eq!(format_number(f64::INFINITY), None);
        assert_eq!(format_number(1e16), None);
    }
}

//! Meteor Strike entry point
//!
//! Native: runs a headless auto-played session through every stage.
//! Web: initialises logging and loads progress from LocalStorage; the page
//! drives ticks.

use glam::Vec3;
use meteor_strike::progress::StageDefinition;
use meteor_strike::puzzle::ConveyorLine;

/// The stage map: two tutorial stages, two branches, then the boss
fn stage_registry() -> Vec<StageDefinition> {
    vec![
        StageDefinition::new("orbit-1", &[]),
        StageDefinition::new("orbit-2", &["orbit-1"]),
        StageDefinition::new("moon-1", &["orbit-2"]),
        StageDefinition::new("mars-1", &["orbit-2"]),
        StageDefinition::new("asteroid-boss", &["moon-1", "mars-1"]),
    ]
}

/// Three lanes across the sky, the middle one running the other way
fn conveyor_lines() -> Vec<ConveyorLine> {
    vec![
        ConveyorLine::new(Vec3::new(-400.0, 120.0, 0.0), Vec3::new(400.0, 120.0, 0.0)),
        ConveyorLine::new(Vec3::new(-400.0, 0.0, 0.0), Vec3::new(400.0, 0.0, 0.0)).reversed(),
        ConveyorLine::new(Vec3::new(-400.0, -120.0, 0.0), Vec3::new(400.0, -120.0, 0.0)),
    ]
}

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use meteor_strike::Game;
    use meteor_strike::persistence::LocalStore;

    #[wasm_bindgen(start)]
    pub fn wasm_main() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let seed = js_sys::Date::now() as u64;
        match Game::load(&LocalStore, super::conveyor_lines(), &super::stage_registry(), seed) {
            Ok(game) => log::info!(
                "Meteor Strike loaded: {} stages",
                game.world().nodes().len()
            ),
            Err(e) => log::error!("Failed to load game: {}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Meteor Strike (native) starting...");

    if let Err(e) = native::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::Cell;
    use std::rc::Rc;

    use meteor_strike::consts::FRAME_DT;
    use meteor_strike::game::{GameError, SessionOutcome};
    use meteor_strike::persistence::{FileStore, MemoryStore, SaveStore};
    use meteor_strike::progress::{ProgressEvent, StageState};
    use meteor_strike::puzzle::RecordingHost;
    use meteor_strike::{Calculator, Game};

    /// Frames an auto-played stage may take before the demo gives up on it
    const MAX_FRAMES_PER_STAGE: u32 = 60 * 600;
    /// Every n-th pick is deliberately wrong
    const MISS_EVERY: u32 = 4;

    /// Optional first argument: directory for save files
    pub fn run() -> Result<(), GameError> {
        let mut store: Box<dyn SaveStore> = match std::env::args().nth(1) {
            Some(dir) => Box::new(FileStore::new(dir)),
            None => Box::new(MemoryStore::new()),
        };

        let mut game = Game::load(
            &*store,
            super::conveyor_lines(),
            &super::stage_registry(),
            0x5EED,
        )?;

        let finished = Rc::new(Cell::new(false));
        let f = finished.clone();
        game.world_mut().events_mut().subscribe(move |event| {
            if *event == ProgressEvent::GameComplete {
                println!("*** All stages cleared - the planet is safe! ***");
                f.set(true);
            }
        });

        let mut host = RecordingHost::new();
        let mut picks = 0u32;

        while !finished.get() {
            let Some(stage) = game
                .world()
                .nodes()
                .iter()
                .find(|n| n.state() == StageState::Available)
                .map(|n| n.id.clone())
            else {
                // Everything cleared at load, or nothing reachable
                break;
            };

            game.enter_stage(&stage, &mut host)?;
            println!("Stage {}: {}", stage, game.puzzle().prompt());

            let mut frames = 0;
            while game.session().is_some() && frames < MAX_FRAMES_PER_STAGE {
                game.tick(FRAME_DT, &mut host);
                frames += 1;

                let Some(token) = pick(&game, picks) else {
                    continue;
                };
                picks += 1;
                match game.select_token(token, &mut host)? {
                    SessionOutcome::Miss => println!("  miss"),
                    SessionOutcome::NextChallenge => println!("  hit! next: {}", game.puzzle().prompt()),
                    SessionOutcome::StageCleared => println!("  stage {} cleared", stage),
                    SessionOutcome::StageLost => println!("  stage {} lost", stage),
                }
            }
            if game.session().is_some() {
                log::warn!("Giving up on stage '{}'", stage);
                game.leave_stage(&mut host);
            }
            game.save(&mut *store)?;
        }
        // Fire the all-clear check for the final clear
        game.tick(0.0, &mut host);

        println!(
            "Tokens created: {}, destroyed: {}, still live: {}",
            host.created,
            host.destroyed,
            host.live.len()
        );

        calculator_demo(game.calculator_mut());
        Ok(())
    }

    /// Auto-player: grab the correct token, except for every n-th pick
    fn pick(game: &Game, picks: u32) -> Option<meteor_strike::puzzle::TokenId> {
        let puzzle = game.puzzle();
        if (picks + 1) % MISS_EVERY == 0 {
            let correct = puzzle.catalog().correct_template();
            puzzle
                .conveyors()
                .iter()
                .flat_map(|c| c.active())
                .find(|t| Some(t.template) != correct)
                .map(|t| t.id)
        } else {
            puzzle.find_correct_token()
        }
    }

    fn calculator_demo(calc: &mut Calculator) {
        for keys in ["2+2", "6x7", "(3+4)*2", "5/0", "1.5x4-1"] {
            calc.clear();
            calc.push_str(keys);
            match calc.evaluate() {
                Ok(result) => println!("{} = {}", keys, result),
                Err(e) => println!("{} -> invalid ({})", keys, e),
            }
        }
    }
}

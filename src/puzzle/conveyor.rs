//! Conveyor lines that carry and recycle answer tokens
//!
//! Every token is owned by exactly one conveyor and sits in exactly one of
//! its two containers:
//! - `pool`: parked, reused FIFO on the next spawn
//! - `active`: travelling from the origin anchor to the destination anchor
//!
//! Tokens are only created when the pool is empty and only destroyed by
//! [`Conveyor::teardown`].

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::PuzzleError;
use super::catalog::Catalog;
use super::host::TokenHost;
use crate::move_towards;

/// Stable identity of a token visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConveyorId(pub usize);

/// Token ID allocator shared by all conveyors of a puzzle
#[derive(Debug, Clone)]
pub struct TokenIds {
    next: u32,
}

impl Default for TokenIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TokenIds {
    pub fn next_id(&mut self) -> TokenId {
        let id = TokenId(self.next);
        self.next += 1;
        id
    }
}

/// One positioned instance of a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    /// Index into the catalog
    pub template: usize,
    pub pos: Vec3,
    pub owner: ConveyorId,
}

/// How a travelling token decides it has arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrivalMode {
    /// Unclamped linear step, arrival only on exact equality with the
    /// destination. Tokens whose steps never land on it exactly keep
    /// travelling past the end and are never recycled.
    Exact,
    /// Step toward the destination and land on it once the step reaches or passes it
    #[default]
    Clamped,
}

/// Anchors of a conveyor line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConveyorLine {
    pub start: Vec3,
    pub end: Vec3,
    /// Tokens travel end → start instead
    #[serde(default)]
    pub reversed: bool,
}

impl ConveyorLine {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self {
            start,
            end,
            reversed: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// Where tokens spawn
    pub fn origin(&self) -> Vec3 {
        if self.reversed { self.end } else { self.start }
    }

    /// Where tokens get recycled
    pub fn destination(&self) -> Vec3 {
        if self.reversed { self.start } else { self.end }
    }
}

#[derive(Debug, Clone)]
pub struct Conveyor {
    pub id: ConveyorId,
    pub line: ConveyorLine,
    /// Travel speed (units/s)
    pub speed: f32,
    /// Seconds between spawns
    pub spawn_interval: f32,
    pub arrival: ArrivalMode,
    spawn_timer: f32,
    running: bool,
    pool: VecDeque<Token>,
    active: Vec<Token>,
    next_template: usize,
}

impl Conveyor {
    pub fn new(
        id: ConveyorId,
        line: ConveyorLine,
        speed: f32,
        spawn_interval: f32,
        arrival: ArrivalMode,
    ) -> Self {
        Self {
            id,
            line,
            speed,
            spawn_interval,
            arrival,
            spawn_timer: 0.0,
            running: false,
            pool: VecDeque::new(),
            active: Vec::new(),
            next_template: 0,
        }
    }

    /// Start spawning and moving on subsequent ticks
    pub fn activate(&mut self) {
        self.running = true;
    }

    /// Freeze in place. Active tokens stay where they are.
    pub fn deactivate(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pool(&self) -> impl Iterator<Item = &Token> {
        self.pool.iter()
    }

    pub fn active(&self) -> &[Token] {
        &self.active
    }

    pub fn total_tokens(&self) -> usize {
        self.pool.len() + self.active.len()
    }

    pub fn next_template(&self) -> usize {
        self.next_template
    }

    pub fn spawn_timer(&self) -> f32 {
        self.spawn_timer
    }

    /// Advance one tick: move and recycle first, then spawn
    pub fn tick(
        &mut self,
        dt: f32,
        catalog: &Catalog,
        ids: &mut TokenIds,
        host: &mut dyn TokenHost,
    ) {
        if !self.running {
            return;
        }

        self.advance(dt, host);

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            if let Err(e) = self.spawn(catalog, ids, host) {
                log::warn!("Conveyor {:?} could not spawn: {}", self.id, e);
            }
            self.spawn_timer = self.spawn_interval;
        }
    }

    /// Move every active token toward the destination, recycling arrivals
    fn advance(&mut self, dt: f32, host: &mut dyn TokenHost) {
        let origin = self.line.origin();
        let dest = self.line.destination();
        let step = self.speed * dt;
        let dir = (dest - origin).normalize_or_zero();

        let mut i = 0;
        while i < self.active.len() {
            let token = &mut self.active[i];
            token.pos = match self.arrival {
                ArrivalMode::Exact => token.pos + dir * step,
                ArrivalMode::Clamped => move_towards(token.pos, dest, step),
            };
            host.set_position(token);

            if token.pos == dest {
                let token = self.active.remove(i);
                log::debug!("Recycled token {:?} on {:?}", token.id, self.id);
                self.pool.push_back(token);
            } else {
                i += 1;
            }
        }
    }

    /// Put one token on the line at the origin anchor, reusing the pool first
    pub fn spawn(
        &mut self,
        catalog: &Catalog,
        ids: &mut TokenIds,
        host: &mut dyn TokenHost,
    ) -> Result<TokenId, PuzzleError> {
        let mut token = match self.pool.pop_front() {
            Some(token) => token,
            None => self.generate(catalog, ids, host)?,
        };
        token.pos = self.line.origin();
        host.set_position(&token);
        let id = token.id;
        self.active.push(token);
        Ok(id)
    }

    /// Instantiate a new token from the template cursor, then advance and wrap it
    fn generate(
        &mut self,
        catalog: &Catalog,
        ids: &mut TokenIds,
        host: &mut dyn TokenHost,
    ) -> Result<Token, PuzzleError> {
        if catalog.is_empty() {
            return Err(PuzzleError::EmptyCatalog);
        }
        let template = self.next_template % catalog.len();
        self.next_template = (template + 1) % catalog.len();

        let token = Token {
            id: ids.next_id(),
            template,
            pos: self.line.origin(),
            owner: self.id,
        };
        if let Some(piece) = catalog.get(template) {
            host.create(&token, piece);
        }
        Ok(token)
    }

    /// Fill the pool with one full catalog cycle starting at `offset`
    pub fn prefill(
        &mut self,
        catalog: &Catalog,
        offset: usize,
        ids: &mut TokenIds,
        host: &mut dyn TokenHost,
    ) -> Result<(), PuzzleError> {
        if catalog.is_empty() {
            return Err(PuzzleError::EmptyCatalog);
        }
        self.next_template = offset % catalog.len();
        for _ in 0..catalog.len() {
            let token = self.generate(catalog, ids, host)?;
            self.pool.push_back(token);
        }
        Ok(())
    }

    /// Pull an active token off the line and park it in the pool.
    /// Returns its catalog template.
    pub fn recycle(&mut self, id: TokenId) -> Option<usize> {
        let index = self.active.iter().position(|t| t.id == id)?;
        let token = self.active.remove(index);
        let template = token.template;
        self.pool.push_back(token);
        Some(template)
    }

    /// Destroy every token, active and pooled. Safe to repeat.
    pub fn teardown(&mut self, host: &mut dyn TokenHost) {
        for token in self.active.drain(..).chain(self.pool.drain(..)) {
            host.destroy(&token);
        }
        self.spawn_timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::challenge::{Answer, AnswerSet};
    use crate::puzzle::host::RecordingHost;
    use proptest::prelude::*;

    fn catalog(n: usize) -> Catalog {
        Catalog::build(&AnswerSet {
            prompt: "test".to_string(),
            answers: (0..n)
                .map(|i| Answer {
                    label: format!("{} g", i),
                    value: i as f64,
                    correct: i == 0,
                })
                .collect(),
        })
    }

    /// 8 units long, 4 units/s, spawn every second
    fn conveyor(arrival: ArrivalMode) -> Conveyor {
        let line = ConveyorLine::new(Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0));
        Conveyor::new(ConveyorId(0), line, 4.0, 1.0, arrival)
    }

    #[test]
    fn test_inactive_conveyor_does_nothing() {
        let catalog = catalog(3);
        let mut c = conveyor(ArrivalMode::Clamped);
        c.tick(0.5, &catalog, &mut TokenIds::default(), &mut ());
        assert_eq!(c.total_tokens(), 0);
    }

    #[test]
    fn test_first_tick_spawns_one_token_at_origin() {
        let catalog = catalog(3);
        let mut ids = TokenIds::default();
        let mut host = RecordingHost::new();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.activate();

        c.tick(0.25, &catalog, &mut ids, &mut host);
        assert_eq!(c.active().len(), 1);
        assert_eq!(c.active()[0].pos, Vec3::ZERO);
        assert_eq!(c.active()[0].template, 0);
        assert_eq!(c.next_template(), 1);
        assert_eq!(host.created, 1);
        assert_eq!(c.spawn_timer(), 1.0);
    }

    #[test]
    fn test_movement_before_spawn() {
        let catalog = catalog(3);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.activate();

        c.tick(0.5, &catalog, &mut ids, &mut ());
        // Second tick: the first token moves, no spawn yet (timer 1.0 → 0.5)
        c.tick(0.5, &catalog, &mut ids, &mut ());
        assert_eq!(c.active().len(), 1);
        assert_eq!(c.active()[0].pos, Vec3::new(2.0, 0.0, 0.0));

        // Third tick: token moves again, timer hits zero, new token spawns at origin
        c.tick(0.5, &catalog, &mut ids, &mut ());
        assert_eq!(c.active().len(), 2);
        assert_eq!(c.active()[0].pos, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(c.active()[1].pos, Vec3::ZERO);
    }

    #[test]
    fn test_arrival_recycles_into_pool() {
        let catalog = catalog(3);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.spawn_interval = 100.0;
        c.activate();

        c.tick(0.0, &catalog, &mut ids, &mut ());
        let id = c.active()[0].id;
        // 8 units at 4 units/s: two seconds
        for _ in 0..4 {
            c.tick(0.5, &catalog, &mut ids, &mut ());
        }
        assert!(c.active().is_empty());
        let pooled: Vec<TokenId> = c.pool().map(|t| t.id).collect();
        assert_eq!(pooled, vec![id]);
        assert_eq!(c.total_tokens(), 1);
    }

    #[test]
    fn test_pool_reused_before_generating() {
        let catalog = catalog(3);
        let mut ids = TokenIds::default();
        let mut host = RecordingHost::new();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.prefill(&catalog, 1, &mut ids, &mut host).unwrap();
        assert_eq!(host.created, 3);

        c.spawn(&catalog, &mut ids, &mut host).unwrap();
        assert_eq!(host.created, 3);
        assert_eq!(c.active()[0].template, 1);
    }

    #[test]
    fn test_generator_wraps_template_cursor() {
        let catalog = catalog(2);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        for _ in 0..5 {
            c.spawn(&catalog, &mut ids, &mut ()).unwrap();
        }
        let templates: Vec<usize> = c.active().iter().map(|t| t.template).collect();
        assert_eq!(templates, vec![0, 1, 0, 1, 0]);
        assert!(c.next_template() < catalog.len());
    }

    #[test]
    fn test_spawn_with_empty_catalog_is_noop() {
        let catalog = catalog(0);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        assert_eq!(
            c.spawn(&catalog, &mut ids, &mut ()),
            Err(PuzzleError::EmptyCatalog)
        );
        c.activate();
        c.tick(1.0, &catalog, &mut ids, &mut ());
        assert_eq!(c.total_tokens(), 0);
    }

    #[test]
    fn test_reversed_line_spawns_at_end() {
        let catalog = catalog(1);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.line = c.line.reversed();
        c.spawn(&catalog, &mut ids, &mut ()).unwrap();
        assert_eq!(c.active()[0].pos, Vec3::new(8.0, 0.0, 0.0));
        c.activate();
        c.spawn_interval = 100.0;
        c.tick(0.5, &catalog, &mut ids, &mut ());
        assert_eq!(c.active()[0].pos, Vec3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_exact_mode_recycles_on_exact_landing() {
        let catalog = catalog(1);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Exact);
        c.spawn_interval = 100.0;
        c.activate();
        c.tick(0.0, &catalog, &mut ids, &mut ());
        for _ in 0..4 {
            c.tick(0.5, &catalog, &mut ids, &mut ());
        }
        assert!(c.active().is_empty());
        assert_eq!(c.pool().count(), 1);
    }

    #[test]
    fn test_exact_mode_overshoot_never_recycles() {
        let catalog = catalog(1);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Exact);
        c.spawn_interval = 100.0;
        c.activate();
        c.tick(0.0, &catalog, &mut ids, &mut ());
        // Steps of 3 units: 3, 6, 9, ... never exactly 8
        for _ in 0..10 {
            c.tick(0.75, &catalog, &mut ids, &mut ());
        }
        assert_eq!(c.active().len(), 1);
        assert!(c.active()[0].pos.x > 8.0);

        // Clamped mode lands on the anchor with the same steps
        let mut c = conveyor(ArrivalMode::Clamped);
        c.spawn_interval = 100.0;
        c.activate();
        c.tick(0.0, &catalog, &mut ids, &mut ());
        for _ in 0..3 {
            c.tick(0.75, &catalog, &mut ids, &mut ());
        }
        assert!(c.active().is_empty());
    }

    #[test]
    fn test_deactivate_keeps_active_tokens() {
        let catalog = catalog(2);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.activate();
        c.tick(0.5, &catalog, &mut ids, &mut ());
        c.tick(0.5, &catalog, &mut ids, &mut ());
        let before = c.active()[0].pos;

        c.deactivate();
        c.tick(0.5, &catalog, &mut ids, &mut ());
        assert_eq!(c.active().len(), 1);
        assert_eq!(c.active()[0].pos, before);
    }

    #[test]
    fn test_recycle_selected_token() {
        let catalog = catalog(3);
        let mut ids = TokenIds::default();
        let mut c = conveyor(ArrivalMode::Clamped);
        let id = c.spawn(&catalog, &mut ids, &mut ()).unwrap();
        assert_eq!(c.recycle(id), Some(0));
        assert_eq!(c.recycle(id), None);
        assert_eq!(c.pool().count(), 1);
        assert!(c.active().is_empty());
    }

    #[test]
    fn test_teardown_idempotent() {
        let catalog = catalog(3);
        let mut ids = TokenIds::default();
        let mut host = RecordingHost::new();
        let mut c = conveyor(ArrivalMode::Clamped);
        c.prefill(&catalog, 0, &mut ids, &mut host).unwrap();
        c.spawn(&catalog, &mut ids, &mut host).unwrap();

        c.teardown(&mut host);
        assert_eq!(c.total_tokens(), 0);
        assert_eq!(host.destroyed, 3);
        assert!(host.live.is_empty());

        c.teardown(&mut host);
        assert_eq!(c.total_tokens(), 0);
        assert_eq!(host.destroyed, 3);
    }

    proptest! {
        #[test]
        fn prop_tokens_never_lost(
            dts in proptest::collection::vec(0.0f32..0.1, 1..300),
            interval in 0.05f32..1.0,
            m in 1usize..6,
        ) {
            let catalog = catalog(m);
            let mut ids = TokenIds::default();
            let mut c = conveyor(ArrivalMode::Clamped);
            c.spawn_interval = interval;
            c.activate();

            let mut last = c.total_tokens();
            for dt in dts {
                c.tick(dt, &catalog, &mut ids, &mut ());
                let total = c.total_tokens();
                prop_assert!(total >= last);
                prop_assert!(c.next_template() < m);
                last = total;
            }
        }
    }
}

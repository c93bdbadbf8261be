//! Spatial transform facility the puzzle drives
//!
//! The core never renders. It only asks the host to create a visual for a
//! token, move it, and destroy it.

use std::collections::BTreeMap;

use glam::Vec3;

use super::catalog::PieceTemplate;
use super::conveyor::{Token, TokenId};

pub trait TokenHost {
    /// A new token was instantiated from `piece`
    fn create(&mut self, token: &Token, piece: &PieceTemplate);
    /// The token's position changed
    fn set_position(&mut self, token: &Token);
    /// The token is gone for good
    fn destroy(&mut self, token: &Token);
}

/// Headless host
impl TokenHost for () {
    fn create(&mut self, _token: &Token, _piece: &PieceTemplate) {}
    fn set_position(&mut self, _token: &Token) {}
    fn destroy(&mut self, _token: &Token) {}
}

/// Host that tracks live token visuals (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    /// Live visuals: position and label
    pub live: BTreeMap<TokenId, (Vec3, String)>,
    pub created: usize,
    pub destroyed: usize,
    pub moves: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, id: TokenId) -> Option<Vec3> {
        self.live.get(&id).map(|(pos, _)| *pos)
    }
}

impl TokenHost for RecordingHost {
    fn create(&mut self, token: &Token, piece: &PieceTemplate) {
        self.created += 1;
        self.live.insert(token.id, (token.pos, piece.label.clone()));
    }

    fn set_position(&mut self, token: &Token) {
        self.moves += 1;
        if let Some(entry) = self.live.get_mut(&token.id) {
            entry.0 = token.pos;
        }
    }

    fn destroy(&mut self, token: &Token) {
        if self.live.remove(&token.id).is_some() {
            self.destroyed += 1;
        }
    }
}

//! Canonical answer catalog
//!
//! Built once per puzzle activation from the challenge's answer set. The
//! catalog is read-only afterwards; conveyors only clone tokens from it.

use serde::{Deserialize, Serialize};

use super::challenge::AnswerSet;
use super::conveyor::{Conveyor, TokenIds};
use super::host::TokenHost;
use super::PuzzleError;

/// Prototype for one answer symbol. Never displayed directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceTemplate {
    pub label: String,
    pub value: f64,
    pub correct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pieces: Vec<PieceTemplate>,
}

impl Catalog {
    /// Build the catalog from a challenge's candidate answers, in order
    pub fn build(answers: &AnswerSet) -> Self {
        let pieces: Vec<PieceTemplate> = answers
            .answers
            .iter()
            .map(|a| PieceTemplate {
                label: a.label.clone(),
                value: a.value,
                correct: a.correct,
            })
            .collect();

        if pieces.is_empty() {
            log::warn!("Built an empty catalog for '{}'", answers.prompt);
        } else {
            log::debug!("Catalog for '{}': {} pieces", answers.prompt, pieces.len());
        }
        Self { pieces }
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn get(&self, template: usize) -> Option<&PieceTemplate> {
        self.pieces.get(template)
    }

    pub fn pieces(&self) -> &[PieceTemplate] {
        &self.pieces
    }

    /// Template index of the correct answer, if the catalog has one
    pub fn correct_template(&self) -> Option<usize> {
        self.pieces.iter().position(|p| p.correct)
    }

    /// Starting template offset for the `index`-th conveyor (round-robin)
    pub fn start_offset(&self, index: usize) -> usize {
        if self.pieces.is_empty() {
            0
        } else {
            index % self.pieces.len()
        }
    }

    /// Pre-fill every conveyor's pool with one full cycle of the catalog.
    ///
    /// Conveyor `i` starts at template `i mod len` and wraps around, so
    /// neighbouring conveyors never show the same sequence in lockstep.
    pub fn distribute(
        &self,
        conveyors: &mut [Conveyor],
        ids: &mut TokenIds,
        host: &mut dyn TokenHost,
    ) -> Result<(), PuzzleError> {
        if self.is_empty() {
            return Err(PuzzleError::EmptyCatalog);
        }
        for (i, conveyor) in conveyors.iter_mut().enumerate() {
            conveyor.prefill(self, self.start_offset(i), ids, host)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::challenge::Answer;
    use crate::puzzle::conveyor::{ArrivalMode, ConveyorId, ConveyorLine};
    use glam::Vec3;
    use proptest::prelude::*;

    fn answer_set(n: usize) -> AnswerSet {
        AnswerSet {
            prompt: "test".to_string(),
            answers: (0..n)
                .map(|i| Answer {
                    label: format!("{} m", i),
                    value: i as f64,
                    correct: i == 0,
                })
                .collect(),
        }
    }

    fn conveyors(n: usize) -> Vec<Conveyor> {
        (0..n)
            .map(|i| {
                let line = ConveyorLine::new(
                    Vec3::new(0.0, i as f32, 0.0),
                    Vec3::new(10.0, i as f32, 0.0),
                );
                Conveyor::new(ConveyorId(i), line, 1.0, 1.0, ArrivalMode::Clamped)
            })
            .collect()
    }

    #[test]
    fn test_build_preserves_order() {
        let catalog = Catalog::build(&answer_set(3));
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(1).unwrap().label, "1 m");
        assert_eq!(catalog.correct_template(), Some(0));
    }

    #[test]
    fn test_distribute_empty_catalog_fails() {
        let catalog = Catalog::build(&answer_set(0));
        let mut lines = conveyors(2);
        let result = catalog.distribute(&mut lines, &mut TokenIds::default(), &mut ());
        assert_eq!(result, Err(PuzzleError::EmptyCatalog));
        assert!(lines.iter().all(|c| c.total_tokens() == 0));
    }

    proptest! {
        #[test]
        fn prop_distribution_offsets(n in 1usize..8, m in 1usize..8) {
            let catalog = Catalog::build(&answer_set(m));
            let mut lines = conveyors(n);
            catalog.distribute(&mut lines, &mut TokenIds::default(), &mut ()).unwrap();

            for (i, conveyor) in lines.iter().enumerate() {
                let templates: Vec<usize> = conveyor.pool().map(|t| t.template).collect();
                prop_assert_eq!(templates.len(), m);
                for (k, template) in templates.iter().enumerate() {
                    prop_assert_eq!(*template, (i % m + k) % m);
                }
                prop_assert_eq!(conveyor.next_template(), i % m);
                prop_assert_eq!(conveyor.active().len(), 0);
            }
        }
    }
}

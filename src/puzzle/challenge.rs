//! Unit-conversion challenge generation
//!
//! Each challenge asks the player to convert a quantity between two units of
//! the same family. The answer set holds the correct conversion plus
//! distractors: the quantity converted with the ratio upside down, and the
//! correct value off by a power of ten.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::format_number;

/// A unit, scaled against the smallest unit of its family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub symbol: &'static str,
    /// How many of the family's smallest unit fit in one of this unit
    pub scale: u64,
}

const LENGTH: &[Unit] = &[
    Unit { symbol: "mm", scale: 1 },
    Unit { symbol: "cm", scale: 10 },
    Unit { symbol: "m", scale: 1_000 },
    Unit { symbol: "km", scale: 1_000_000 },
];

const MASS: &[Unit] = &[
    Unit { symbol: "mg", scale: 1 },
    Unit { symbol: "g", scale: 1_000 },
    Unit { symbol: "kg", scale: 1_000_000 },
];

const TIME: &[Unit] = &[
    Unit { symbol: "s", scale: 1 },
    Unit { symbol: "min", scale: 60 },
    Unit { symbol: "h", scale: 3_600 },
];

const VOLUME: &[Unit] = &[
    Unit { symbol: "mL", scale: 1 },
    Unit { symbol: "L", scale: 1_000 },
];

/// Wrong scale factors applied to the correct value to make distractors
const DISTRACTOR_FACTORS: &[f64] = &[10.0, 0.1, 100.0, 0.01, 1000.0, 0.001];

/// Largest whole quantity a challenge starts from
const MAX_QUANTITY: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitFamily {
    Length,
    Mass,
    Time,
    Volume,
}

impl UnitFamily {
    pub const ALL: [UnitFamily; 4] = [
        UnitFamily::Length,
        UnitFamily::Mass,
        UnitFamily::Time,
        UnitFamily::Volume,
    ];

    pub fn units(&self) -> &'static [Unit] {
        match self {
            UnitFamily::Length => LENGTH,
            UnitFamily::Mass => MASS,
            UnitFamily::Time => TIME,
            UnitFamily::Volume => VOLUME,
        }
    }
}

/// One candidate answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Display string, e.g. "5000 m"
    pub label: String,
    pub value: f64,
    pub correct: bool,
}

/// The full answer set of one challenge (correct answer + distractors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub prompt: String,
    pub answers: Vec<Answer>,
}

impl AnswerSet {
    pub fn correct(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.correct)
    }
}

/// Deterministic challenge source
#[derive(Debug, Clone)]
pub struct ChallengeGenerator {
    rng: Pcg32,
}

impl ChallengeGenerator {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Roll the next challenge with up to `distractors` wrong answers
    pub fn next_challenge(&mut self, distractors: usize) -> AnswerSet {
        let family = UnitFamily::ALL[self.rng.random_range(0..UnitFamily::ALL.len())];
        let units = family.units();
        let from_idx = self.rng.random_range(0..units.len());
        // Pick a different target unit
        let mut to_idx = self.rng.random_range(0..units.len() - 1);
        if to_idx >= from_idx {
            to_idx += 1;
        }
        let (from, to) = (units[from_idx], units[to_idx]);

        // Keep both sides whole numbers: scales within a family divide evenly
        let (quantity, converted) = if from.scale >= to.scale {
            let q = self.rng.random_range(1..=MAX_QUANTITY);
            (q, q * (from.scale / to.scale))
        } else {
            let c = self.rng.random_range(1..=MAX_QUANTITY);
            (c * (to.scale / from.scale), c)
        };

        let correct_value = converted as f64;
        let prompt = format!("Convert {} {} to {}", quantity, from.symbol, to.symbol);
        let mut answers = vec![Answer {
            label: label(correct_value, to.symbol).unwrap_or_default(),
            value: correct_value,
            correct: true,
        }];

        // The swapped ratio goes first; power-of-ten misses fill the rest
        let swapped = if from.scale >= to.scale {
            quantity as f64 / (from.scale / to.scale) as f64
        } else {
            quantity as f64 * (to.scale / from.scale) as f64
        };
        let mut factors = DISTRACTOR_FACTORS.to_vec();
        factors.shuffle(&mut self.rng);
        let candidates = std::iter::once(swapped).chain(factors.into_iter().map(|f| correct_value * f));
        for value in candidates {
            if answers.len() > distractors {
                break;
            }
            let Some(text) = label(value, to.symbol) else {
                continue;
            };
            if answers.iter().any(|a| a.label == text) {
                continue;
            }
            answers.push(Answer {
                label: text,
                value,
                correct: false,
            });
        }

        answers.shuffle(&mut self.rng);
        log::debug!("{} ({} answers)", prompt, answers.len());
        AnswerSet { prompt, answers }
    }
}

fn label(value: f64, symbol: &str) -> Option<String> {
    format_number(value).map(|n| format!("{} {}", n, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_correct_answer() {
        let mut generator = ChallengeGenerator::new(42);
        for _ in 0..50 {
            let set = generator.next_challenge(3);
            assert_eq!(set.answers.iter().filter(|a| a.correct).count(), 1);
            assert!(set.answers.len() <= 4);
            assert!(set.answers.len() >= 2);
        }
    }

    #[test]
    fn test_labels_are_unique() {
        let mut generator = ChallengeGenerator::new(7);
        for _ in 0..50 {
            let set = generator.next_challenge(5);
            let mut labels: Vec<_> = set.answers.iter().map(|a| a.label.clone()).collect();
            labels.sort();
            labels.dedup();
            assert_eq!(labels.len(), set.answers.len());
        }
    }

    #[test]
    fn test_correct_answer_converts_prompt() {
        let mut generator = ChallengeGenerator::new(1234);
        for _ in 0..50 {
            let set = generator.next_challenge(3);
            // "Convert <q> <from> to <to>"
            let words: Vec<&str> = set.prompt.split_whitespace().collect();
            let quantity: f64 = words[1].parse().unwrap();
            let family = UnitFamily::ALL
                .iter()
                .find(|f| f.units().iter().any(|u| u.symbol == words[2]))
                .unwrap();
            let scale = |s: &str| family.units().iter().find(|u| u.symbol == s).unwrap().scale;
            let expected = quantity * scale(words[2]) as f64 / scale(words[4]) as f64;
            let correct = set.correct().unwrap();
            assert!((correct.value - expected).abs() < 1e-9, "{}", set.prompt);
            assert!(correct.label.ends_with(words[4]));
        }
    }

    #[test]
    fn test_swapped_ratio_distractor() {
        let mut generator = ChallengeGenerator::new(2024);
        for _ in 0..50 {
            let set = generator.next_challenge(1);
            let words: Vec<&str> = set.prompt.split_whitespace().collect();
            let quantity: f64 = words[1].parse().unwrap();
            let family = UnitFamily::ALL
                .iter()
                .find(|f| f.units().iter().any(|u| u.symbol == words[2]))
                .unwrap();
            let scale = |s: &str| family.units().iter().find(|u| u.symbol == s).unwrap().scale as f64;
            let swapped = quantity * scale(words[4]) / scale(words[2]);
            let expected = label(swapped, words[4]).unwrap();

            assert_eq!(set.answers.len(), 2, "{}", set.prompt);
            let wrong = set.answers.iter().find(|a| !a.correct).unwrap();
            assert_eq!(wrong.label, expected, "{}", set.prompt);
        }
    }

    #[test]
    fn test_same_seed_same_challenges() {
        let mut a = ChallengeGenerator::new(99);
        let mut b = ChallengeGenerator::new(99);
        for _ in 0..10 {
            assert_eq!(a.next_challenge(3), b.next_challenge(3));
        }
    }

    #[test]
    fn test_zero_distractors() {
        let mut generator = ChallengeGenerator::new(5);
        let set = generator.next_challenge(0);
        assert_eq!(set.answers.len(), 1);
        assert!(set.answers[0].correct);
    }
}

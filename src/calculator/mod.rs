//! In-game calculator
//!
//! The display is edited one key at a time; evaluation is stateless and lives
//! in [`expr`].

pub mod expr;

pub use expr::{EvalError, evaluate, normalize};

use crate::settings::CalculatorTuning;

/// Keys the calculator accepts
pub fn is_calculator_symbol(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '+' | '-' | '*' | '/' | '(' | ')' | '.' | 'x' | 'X')
}

/// Calculator display state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculator {
    display: String,
    max_len: usize,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(&CalculatorTuning::default())
    }
}

impl Calculator {
    pub fn new(tuning: &CalculatorTuning) -> Self {
        Self {
            display: String::new(),
            max_len: tuning.max_display_len,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Append a key. Returns false if the symbol is not accepted or the display is full.
    pub fn push(&mut self, ch: char) -> bool {
        if !is_calculator_symbol(ch) || self.display.chars().count() >= self.max_len {
            return false;
        }
        self.display.push(ch);
        true
    }

    /// Append every accepted key of `keys`, stopping when the display fills up
    pub fn push_str(&mut self, keys: &str) {
        for ch in keys.chars() {
            if self.display.chars().count() >= self.max_len {
                break;
            }
            self.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        self.display.pop();
    }

    pub fn clear(&mut self) {
        self.display.clear();
    }

    /// Evaluate the display. On success the display shows the result; on
    /// failure it is left untouched.
    pub fn evaluate(&mut self) -> Result<String, EvalError> {
        let result = evaluate(&self.display)?;
        self.display = result.clone();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator(max_len: usize) -> Calculator {
        Calculator::new(&CalculatorTuning { max_display_len: max_len })
    }

    #[test]
    fn test_editing() {
        let mut calc = calculator(12);
        calc.push_str("12");
        assert_eq!(calc.display(), "12");
        calc.backspace();
        assert_eq!(calc.display(), "1");
        calc.clear();
        assert_eq!(calc.display(), "");
        calc.backspace();
        assert_eq!(calc.display(), "");
    }

    #[test]
    fn test_rejects_unknown_symbols() {
        let mut calc = calculator(12);
        assert!(calc.push('7'));
        assert!(!calc.push('a'));
        assert!(!calc.push(' '));
        assert!(calc.push('x'));
        assert_eq!(calc.display(), "7x");
    }

    #[test]
    fn test_max_length() {
        let mut calc = calculator(3);
        calc.push_str("12345");
        assert_eq!(calc.display(), "123");
        assert!(!calc.push('4'));
        calc.backspace();
        assert!(calc.push('9'));
        assert_eq!(calc.display(), "129");
    }

    #[test]
    fn test_evaluate_replaces_display() {
        let mut calc = calculator(12);
        calc.push_str("6x7");
        assert_eq!(calc.evaluate().as_deref(), Ok("42"));
        assert_eq!(calc.display(), "42");
        calc.push_str("/2");
        assert_eq!(calc.evaluate().as_deref(), Ok("21"));
    }

    #[test]
    fn test_invalid_keeps_display() {
        let mut calc = calculator(12);
        calc.push_str("5/0");
        assert_eq!(calc.evaluate(), Err(EvalError::DivisionByZero));
        assert_eq!(calc.display(), "5/0");

        calc.clear();
        assert_eq!(calc.evaluate(), Err(EvalError::Empty));
    }
}

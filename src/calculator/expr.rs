//! Arithmetic expression evaluation
//!
//! Grammar (usual precedence, left associative):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! ```
//!
//! `x` and `X` are accepted as multiplication. Parentheses nest at most
//! [`MAX_NESTING`] levels deep.

use thiserror::Error;

use crate::format_number;

/// Deepest parenthesis nesting the parser accepts
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("nothing to evaluate")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("parentheses nested too deeply")]
    TooDeep,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result out of range")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::End => "end of input".to_string(),
        }
    }
}

/// Replace the `x`/`X` multiplication aliases with `*`
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .map(|c| if c == 'x' || c == 'X' { '*' } else { c })
        .collect()
}

/// Evaluate `input` and format the result for display
pub fn evaluate(input: &str) -> Result<String, EvalError> {
    let value = evaluate_value(input)?;
    format_number(value).ok_or(EvalError::NotFinite)
}

/// Evaluate `input` to a number
pub fn evaluate_value(input: &str) -> Result<f64, EvalError> {
    let normalized = normalize(input);
    if normalized.trim().is_empty() {
        return Err(EvalError::Empty);
    }
    let tokens = tokenize(&normalized)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_expr()?;
    match parser.peek() {
        Token::End => {}
        Token::RParen => return Err(EvalError::UnbalancedParens),
        other => return Err(EvalError::UnexpectedToken(other.describe())),
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NotFinite)
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let ch = chars[pos];
        let token = match ch {
            c if c.is_whitespace() => {
                pos += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| EvalError::MalformedNumber(text.clone()))?;
                tokens.push(Token::Number(value));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(EvalError::UnexpectedChar(other)),
        };
        tokens.push(token);
        pos += 1;
    }
    tokens.push(Token::End);
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or(Token::End)
    }

    fn parse_expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Token::Plus => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_unary()?;
        loop {
            match self.peek() {
                Token::Star => {
                    self.pos += 1;
                    value *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let divisor = self.parse_unary()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<f64, EvalError> {
        // Fold sign runs without recursing
        let mut negate = false;
        loop {
            match self.peek() {
                Token::Plus => self.pos += 1,
                Token::Minus => {
                    self.pos += 1;
                    negate = !negate;
                }
                _ => break,
            }
        }
        let value = self.parse_primary()?;
        Ok(if negate { -value } else { value })
    }

    fn parse_primary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Token::Number(value) => {
                self.pos += 1;
                Ok(value)
            }
            Token::LParen => {
                if self.depth >= MAX_NESTING {
                    return Err(EvalError::TooDeep);
                }
                self.pos += 1;
                self.depth += 1;
                let value = self.parse_expr()?;
                self.depth -= 1;
                match self.peek() {
                    Token::RParen => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Token::End => Err(EvalError::UnbalancedParens),
                    other => Err(EvalError::UnexpectedToken(other.describe())),
                }
            }
            Token::RParen => Err(EvalError::UnbalancedParens),
            other => Err(EvalError::UnexpectedToken(other.describe())),
        }
    }
}

// SPDX: CC0-1.0

use crate::{EvalError, Number};
use core::fmt;

// a token is an immutable string fragment: a numeric literal (possibly
// signed after normalization), a single-character operator, or a parenthesis.
// no tree is ever built; order in the sequence is the only structure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn push(&mut self, chr: char) {
        self.0.push(chr);
    }

    // integer or decimal literal, optional leading minus
    pub fn is_numeric(&self) -> bool {
        fn digits(part: &str) -> bool {
            !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
        }

        let s = self.0.strip_prefix('-').unwrap_or(&self.0);
        match s.split_once('.') {
            Some((int, frac)) => digits(int) && digits(frac),
            None => digits(s),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.0.as_str(), "+" | "-" | "*" | "/" | "^")
    }

    // `(` and everything unrecognized rank below every real operator
    pub fn precedence(&self) -> i32 {
        match self.0.as_str() {
            "^" => 3,
            "*" | "/" => 2,
            "+" | "-" => 1,
            _ => 0,
        }
    }

    pub fn value(&self) -> Option<Number> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<char> for Token {
    fn from(chr: char) -> Self {
        Self(chr.to_string())
    }
}

fn is_valid_input(chr: char) -> bool {
    chr.is_ascii_digit() || matches!(chr, '(' | ')' | '*' | '/' | '-' | '+' | '.' | '^')
}

// splits the expression into tokens, substituting the live value of `x` as
// it goes. a digit extends the previous token only when the preceding
// character in the raw string is itself a digit, so substituted values never
// swallow trailing digits.
pub fn tokenize(expr: &str, x: Number) -> Result<Vec<Token>, EvalError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut prev: Option<char> = None;

    for (at, chr) in expr.char_indices() {
        if chr.is_ascii_digit() && prev.is_some_and(|p| p.is_ascii_digit()) {
            match tokens.last_mut() {
                Some(last) if last.is_numeric() => last.push(chr),
                _ => tokens.push(Token::from(chr)),
            }
        } else if chr == 'x' {
            tokens.push(Token::from(x.to_string()));
        } else if is_valid_input(chr) {
            tokens.push(Token::from(chr));
        } else {
            return Err(EvalError::InvalidCharacter { at, chr });
        }
        prev = Some(chr);
    }

    Ok(tokens)
}

// SPDX: CC0-1.0

pub mod eval;
pub mod lex;
pub mod norm;
pub mod shell;

use core::{fmt, num::NonZeroU16, ops::Range};

use crate::lex::Token;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("invalid character {chr:?} in expression")]
    InvalidCharacter { at: usize, chr: char },
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,
    #[error("malformed decimal point")]
    MalformedDecimal,
    #[error("expression did not resolve within the iteration bound")]
    Divergence,
    #[error("malformed expression")]
    MalformedExpression,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

#[derive(Clone, Debug)]
pub struct Window {
    pub x: Range<Number>,
    pub y: Range<Number>,
    pub density: NonZeroU16, // samples per x unit
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("x range", &self.x)
            .field("y range", &self.y)
            .field("density", &self.density)
            .finish()
    }
}

// runs the full normalization pipeline, strictly in order: tokenize,
// balance check, decimal assembly, fraction folding, negative resolution
pub fn normalize(expr: &str, x: Number) -> Result<Vec<Token>, EvalError> {
    let tokens = lex::tokenize(expr, x)?;
    norm::check_balance(&tokens)?;
    let tokens = norm::assemble_decimals(tokens)?;
    let tokens = norm::fold_fractions(tokens);
    Ok(norm::resolve_negatives(tokens))
}

// the one operation callers care about: a pure function of (expression, x).
// non-finite results are legitimate outcomes, not failures.
pub fn evaluate(expr: &str, x: Number) -> Result<Number, EvalError> {
    let tokens = normalize(expr, x)?;
    eval::run(&tokens)
}

// sweeps `f` across the window's x range at `density` samples per unit,
// splitting the point sequence into separate runs wherever the result is
// non-finite (asymptotes and undefined points break the drawn line).
// runs are never empty; consecutive non-finite results collapse into a
// single break.
pub fn sample<F, FErr>(mut f: F, window: &Window) -> Result<Vec<Vec<Point<Number>>>, FErr>
where
    F: FnMut(Number) -> Result<Number, FErr>,
{
    let density = Number::from(window.density.get());
    let step = 1.0 / density;
    let span = (window.x.end - window.x.start).clamp(0.0, Number::MAX);
    let nsteps = (span * density) as u32;

    let mut series = Vec::new();
    let mut run: Vec<Point<Number>> = Vec::new();
    for i in 0..=nsteps {
        let x = window.x.start + Number::from(i) * step;
        let y = f(x)?;
        if y.is_finite() {
            run.push(Point { x, y });
        } else if !run.is_empty() {
            series.push(core::mem::take(&mut run));
        }
    }
    if !run.is_empty() {
        series.push(run);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn win(x: Range<Number>, density: u16) -> Window {
        Window {
            x,
            y: -25.0..25.0,
            density: density.try_into().unwrap(),
        }
    }

    #[test]
    fn sample_splits_runs_at_non_finite_results() {
        // 1/x blows up at x = 0
        let series = sample(
            |x| Ok::<_, EvalError>(1.0 / x),
            &win(-1.0..1.0, 1),
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], vec![Point { x: -1.0, y: -1.0 }]);
        assert_eq!(series[1], vec![Point { x: 1.0, y: 1.0 }]);
    }

    #[test]
    fn sample_never_yields_empty_runs() {
        // a stretch of non-finite results is one break, not a run of
        // blank series
        let series = sample(
            |x| Ok::<_, EvalError>(if x < 0.5 { Number::INFINITY } else { x }),
            &win(-1.0..1.0, 1),
        )
        .unwrap();
        assert_eq!(series, vec![vec![Point { x: 1.0, y: 1.0 }]]);

        // nothing finite at all means nothing to draw
        let series = sample(|_| Ok::<_, EvalError>(Number::NAN), &win(-1.0..1.0, 1)).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn sample_propagates_the_first_error() {
        let err = sample(
            |_| Err::<Number, _>(EvalError::MalformedExpression),
            &win(0.0..1.0, 25),
        )
        .unwrap_err();
        assert_eq!(err, EvalError::MalformedExpression);
    }

    #[test]
    fn sample_covers_both_endpoints() {
        let series = sample(|x| Ok::<_, EvalError>(x), &win(-2.0..2.0, 25)).unwrap();
        let run = &series[0];
        assert_eq!(series.len(), 1);
        assert_eq!(run.len(), 101);
        assert_eq!(run.first().unwrap().x, -2.0);
        assert_eq!(run.last().unwrap().x, 2.0);
    }
}

// SPDX: CC0-1.0

// token-stream normalization passes. each pass is a discrete left-to-right
// rewrite over the sequence; none of them rewinds, so patterns that only
// emerge after an earlier splice are deliberately left alone.

use crate::{lex::Token, EvalError};

// unequal counts are fatal here; malformed nesting like `)(` is not caught
// at this stage and surfaces later as an evaluator failure
pub fn check_balance(tokens: &[Token]) -> Result<(), EvalError> {
    let open = tokens.iter().filter(|t| t.as_str() == "(").count();
    let closed = tokens.iter().filter(|t| t.as_str() == ")").count();
    if open == closed {
        Ok(())
    } else {
        Err(EvalError::UnbalancedParentheses)
    }
}

// combines two adjacent tokens into one. a doubled minus cancels to a
// positive, and a bare leading point gains an implicit zero.
pub(crate) fn merge_pair(tokens: &mut Vec<Token>, i: usize) {
    let merged = format!("{}{}", tokens[i], tokens[i + 1]);
    let merged = if merged.contains("--") {
        merged[2..].to_string()
    } else if merged.starts_with('.') {
        format!("0{merged}")
    } else {
        merged
    };
    tokens.splice(i..=i + 1, [Token::from(merged)]);
}

// merges `int "." int` runs into single decimal literals, inserting an
// implicit leading zero when nothing numeric precedes the point. a point
// without a numeric successor is fatal.
pub fn assemble_decimals(mut tokens: Vec<Token>) -> Result<Vec<Token>, EvalError> {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].as_str() == "." {
            let next = tokens.get(i + 1).ok_or(EvalError::MalformedDecimal)?;
            if !next.is_numeric() {
                return Err(EvalError::MalformedDecimal);
            }
            if i > 0 && tokens[i - 1].is_numeric() {
                let merged = format!("{}.{}", tokens[i - 1], tokens[i + 1]);
                tokens.splice(i - 1..=i + 1, [Token::from(merged)]);
            } else {
                merge_pair(&mut tokens, i);
            }
        }
        i += 1;
    }
    Ok(tokens)
}

// pre-computes `number / number` runs into a single literal, unless the
// token after the denominator binds tighter than the division (then the
// denominator really belongs to that operator). when there is no token
// after the denominator the run is left for the evaluator.
pub fn fold_fractions(mut tokens: Vec<Token>) -> Vec<Token> {
    let mut k = 1;
    while k + 1 < tokens.len() {
        if tokens[k].as_str() == "/" && tokens[k - 1].is_numeric() && tokens[k + 1].is_numeric() {
            let folds = tokens
                .get(k + 2)
                .is_some_and(|after| after.precedence() <= tokens[k].precedence());
            if folds {
                if let (Some(numerator), Some(denominator)) =
                    (tokens[k - 1].value(), tokens[k + 1].value())
                {
                    let quotient = numerator / denominator;
                    tokens.splice(k - 1..=k + 1, [Token::from(quotient.to_string())]);
                }
            }
        }
        k += 1;
    }
    tokens
}

// rewrites `-` tokens that denote unary negation: a leading minus gains an
// inserted zero operand, a post-operator minus becomes a synthetic `-1`
// (later combined by implicit multiplication), and in the two-token case
// the sign is merged straight into the operand
pub fn resolve_negatives(mut tokens: Vec<Token>) -> Vec<Token> {
    let mut i = 0;
    while i + 1 < tokens.len() {
        if tokens.len() > 2 {
            if i == 0 {
                if tokens[0].as_str() == "-" {
                    tokens.insert(0, Token::from("0"));
                }
            } else if tokens[i].as_str() == "-" && !tokens[i - 1].is_numeric() {
                tokens[i] = Token::from("-1");
            }
        } else if tokens[i].as_str() == "-" {
            merge_pair(&mut tokens, i);
        }
        i += 1;
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(texts: &[&str]) -> Vec<Token> {
        texts.iter().copied().map(Token::from).collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn balance_counts_only() {
        assert_eq!(check_balance(&toks(&["(", "2", ")"])), Ok(()));
        assert_eq!(
            check_balance(&toks(&["(", "2"])),
            Err(EvalError::UnbalancedParentheses)
        );
        // malformed nesting passes; it is not this stage's job
        assert_eq!(check_balance(&toks(&[")", "("])), Ok(()));
    }

    #[test]
    fn decimal_between_integers_merges_three_tokens() {
        let out = assemble_decimals(toks(&["2", ".", "5"])).unwrap();
        assert_eq!(texts(&out), ["2.5"]);
    }

    #[test]
    fn leading_decimal_gains_a_zero() {
        let out = assemble_decimals(toks(&[".", "5"])).unwrap();
        assert_eq!(texts(&out), ["0.5"]);

        let out = assemble_decimals(toks(&["2", "+", ".", "5"])).unwrap();
        assert_eq!(texts(&out), ["2", "+", "0.5"]);
    }

    #[test]
    fn decimal_without_numeric_successor_is_fatal() {
        assert_eq!(
            assemble_decimals(toks(&["2", ".", ".", "5"])),
            Err(EvalError::MalformedDecimal)
        );
        assert_eq!(
            assemble_decimals(toks(&["2", "."])),
            Err(EvalError::MalformedDecimal)
        );
        assert_eq!(
            assemble_decimals(toks(&["."])),
            Err(EvalError::MalformedDecimal)
        );
    }

    #[test]
    fn fraction_folds_left_to_right_once() {
        let out = fold_fractions(toks(&["6", "/", "2", "/", "3"]));
        assert_eq!(texts(&out), ["3", "/", "3"]);
    }

    #[test]
    fn fraction_yields_to_a_tighter_neighbor() {
        // the denominator is really the base of the exponent
        let out = fold_fractions(toks(&["2", "/", "3", "^", "2"]));
        assert_eq!(texts(&out), ["2", "/", "3", "^", "2"]);
    }

    #[test]
    fn fraction_without_lookahead_is_left_alone() {
        let out = fold_fractions(toks(&["1", "/", "0"]));
        assert_eq!(texts(&out), ["1", "/", "0"]);
    }

    #[test]
    fn leading_minus_gains_a_zero_operand() {
        let out = resolve_negatives(toks(&["-", "5", "+", "3"]));
        assert_eq!(texts(&out), ["0", "-", "5", "+", "3"]);
    }

    #[test]
    fn post_operator_minus_becomes_negative_one() {
        let out = resolve_negatives(toks(&["2", "*", "-", "3"]));
        assert_eq!(texts(&out), ["2", "*", "-1", "3"]);
    }

    #[test]
    fn two_token_minus_merges_into_the_operand() {
        let out = resolve_negatives(toks(&["-", "5"]));
        assert_eq!(texts(&out), ["-5"]);

        // doubled minus cancels
        let out = resolve_negatives(toks(&["-", "-5"]));
        assert_eq!(texts(&out), ["5"]);

        // sign in front of an assembled decimal keeps the zero prefix
        let out = resolve_negatives(toks(&["-", "0.5"]));
        assert_eq!(texts(&out), ["-0.5"]);
    }
}

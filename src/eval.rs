// SPDX: CC0-1.0

// precedence-driven dual-stack evaluator. a single left-to-right scan over
// the normalized token sequence defers operators on one stack and operands
// on the other; `(` sentinels mark unresolved scopes, and a set-aside
// buffer shields numbers belonging to already-closed sibling scopes while
// the innermost scope collapses.

use crate::{lex::Token, EvalError, Number};

// iteration allowance for every resolution loop. exhausting it means the
// token sequence cannot resolve and is reported as divergence instead of
// looping forever.
pub const MAX_RESOLVE_STEPS: u32 = 50;

#[derive(Clone, Copy, Debug)]
struct Fuel(u32);

impl Fuel {
    const fn full() -> Self {
        Self(MAX_RESOLVE_STEPS)
    }

    fn spend(&mut self) -> Result<(), EvalError> {
        if self.0 == 0 {
            return Err(EvalError::Divergence);
        }
        self.0 -= 1;
        Ok(())
    }
}

fn apply_op(op: &Token, a: Number, b: Number) -> Option<Number> {
    Some(match op.as_str() {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        "^" => a.powf(b),
        _ => return None,
    })
}

fn implicit_multiplication(current: &Token, next: &Token) -> bool {
    (current.is_numeric() || current.as_str() == ")")
        && (next.is_numeric() || next.as_str() == "(")
}

#[derive(Debug, Default)]
struct Machine {
    operators: Vec<Token>,
    numbers: Vec<Number>,
}

impl Machine {
    // combines numbers[index] and numbers[index + 1] in place. returns None
    // when the operand slots are out of range; callers treat that as
    // "nothing more to do" rather than a fatal error.
    fn apply(&mut self, index: usize, op: &Token) -> Option<()> {
        if index + 1 >= self.numbers.len() {
            return None;
        }
        let a = self.numbers[index];
        let b = self.numbers[index + 1];
        let result = apply_op(op, a, b)?;
        self.numbers.splice(index..=index + 1, [result]);
        Some(())
    }

    // handles one binary operator from the scan. pops tighter-binding
    // operators first, then pushes the incoming one, then resolves the
    // look-ahead conflict where the freshly pushed operator binds tighter
    // than the one beneath it by consuming the next token early. stack
    // underflow or a missing look-ahead token aborts the step quietly,
    // dropping whatever was not yet applied.
    fn scan_operator(
        &mut self,
        token: &Token,
        tokens: &[Token],
        i: &mut usize,
    ) -> Result<(), EvalError> {
        while let Some(top) = self.operators.last() {
            if top.precedence() <= token.precedence() {
                break;
            }
            if self.numbers.len() < 2 {
                // the incoming operator is dropped along with the step
                return Ok(());
            }
            let Some(op) = self.operators.pop() else {
                return Ok(());
            };
            let index = self.numbers.len() - 2;
            if self.apply(index, &op).is_none() {
                return Ok(());
            }
        }

        self.operators.push(token.clone());

        let len = self.operators.len();
        if len < 2 {
            return Ok(());
        }
        let top = &self.operators[len - 1];
        let under = &self.operators[len - 2];
        if top.precedence() > under.precedence() && under.as_str() != "(" {
            let Some(next) = tokens.get(*i + 1) else {
                return Ok(());
            };
            let value: Number = next
                .as_str()
                .parse()
                .map_err(|_| EvalError::MalformedExpression)?;
            self.numbers.push(value);
            *i += 1;
            if self.numbers.len() < 2 {
                return Ok(());
            }
            let Some(op) = self.operators.pop() else {
                return Ok(());
            };
            let index = self.numbers.len() - 2;
            self.apply(index, &op);
        }
        Ok(())
    }

    // offset, counted from the top of the operator stack, of the nearest
    // `(` sentinel
    fn paren_offset(&self) -> Option<usize> {
        self.operators.iter().rev().position(|t| t.as_str() == "(")
    }

    // total number of operators sitting between consecutive `(` sentinels;
    // each one owes a result that belongs to a scope outside the innermost
    fn operators_between(&self) -> usize {
        let mut count = 0;
        for (i, token) in self.operators.iter().enumerate().rev() {
            if token.as_str() == "(" {
                for below in self.operators[..i].iter().rev() {
                    if below.as_str() == "(" {
                        break;
                    }
                    count += 1;
                }
            }
        }
        count
    }

    // collapses the innermost open scope to a single number. numbers owed
    // to enclosing scopes are set aside for the duration and spliced back
    // onto the front afterwards in their original order.
    fn close_scope(&mut self, set_aside: &mut Vec<Number>) -> Result<(), EvalError> {
        self.numbers.reverse();

        let offset = self.paren_offset();
        let between = self.operators_between();
        for _ in 0..between {
            let shielded = self.numbers.pop().ok_or(EvalError::MalformedExpression)?;
            set_aside.push(shielded);
        }

        self.numbers.reverse();

        // with no sentinel on the stack the scan range is empty and the
        // resolver's fuel guard decides the outcome
        let start = match offset {
            Some(offset) => self.operators.len() - offset,
            None => self.operators.len() + 1,
        };
        self.resolve(start)?;

        self.numbers.splice(0..0, set_aside.drain(..));
        Ok(())
    }

    // resolves operators at `start..` against their adjacent operand pairs,
    // one priority level at a time from tightest to loosest, until at most
    // one number remains in scope. a trailing `(` sentinel is then popped.
    fn resolve(&mut self, start: usize) -> Result<(), EvalError> {
        let mut fuel = Fuel::full();
        let mut priority = 3;
        while self.numbers.len() > 1 {
            let mut i = start;
            if i >= self.operators.len() {
                // a sweep that visits no operators cannot make progress;
                // charge it so the guard fires instead of spinning
                fuel.spend()?;
            }
            while i < self.operators.len() {
                fuel.spend()?;
                if self.operators[i].precedence() == priority {
                    let op = self.operators[i].clone();
                    let index = i - start + 1;
                    if self.apply(index - 1, &op).is_some() {
                        // the stack shrank; the scan pointer stays put
                        self.operators.remove(i);
                    }
                    // on an out-of-range operand the pointer also stays
                    // put and the fuel guard breaks the stall
                } else {
                    i += 1;
                }
            }
            priority -= 1;
        }

        if self.operators.last().is_some_and(|t| t.as_str() == "(") {
            self.operators.pop();
        }
        Ok(())
    }
}

// evaluates a normalized token sequence down to one residual number.
// unrecognized leftover tokens are skipped, matching the lenient handling
// of partial expressions throughout.
pub fn run(tokens: &[Token]) -> Result<Number, EvalError> {
    let mut machine = Machine::default();
    let mut set_aside: Vec<Number> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.is_numeric() {
            let value = token.value().ok_or(EvalError::MalformedExpression)?;
            machine.numbers.push(value);
        } else if token.is_operator() {
            machine.scan_operator(token, tokens, &mut i)?;
        } else if token.as_str() == "(" {
            machine.operators.push(token.clone());
        } else if token.as_str() == ")" {
            machine.close_scope(&mut set_aside)?;
        }

        // adjacency with no explicit operator implies multiplication; the
        // scan index may have advanced, so look at the live position
        if let Some(next) = tokens.get(i + 1) {
            if implicit_multiplication(&tokens[i], next) {
                machine.operators.push(Token::from("*"));
            }
        }

        i += 1;
    }

    let mut fuel = Fuel::full();
    while !machine.operators.is_empty() {
        fuel.spend()?;
        machine.resolve(0)?;
    }

    machine.numbers.pop().ok_or(EvalError::MalformedExpression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(texts: &[&str]) -> Vec<Token> {
        texts.iter().copied().map(Token::from).collect()
    }

    #[test]
    fn single_number_is_its_own_result() {
        assert_eq!(run(&toks(&["42"])), Ok(42.0));
        assert_eq!(run(&toks(&["-5"])), Ok(-5.0));
    }

    #[test]
    fn looser_operator_defers_to_the_pending_tighter_one() {
        assert_eq!(run(&toks(&["2", "*", "3", "+", "4"])), Ok(10.0));
    }

    #[test]
    fn tighter_operator_consumes_the_next_token_early() {
        assert_eq!(run(&toks(&["2", "+", "3", "*", "4"])), Ok(14.0));
        assert_eq!(run(&toks(&["2", "/", "3", "^", "2"])), Ok(2.0 / 9.0));
    }

    #[test]
    fn exponent_resolves_left_to_right_at_equal_priority() {
        assert_eq!(run(&toks(&["2", "^", "3", "^", "2"])), Ok(64.0));
    }

    #[test]
    fn scope_collapses_before_the_surrounding_operator() {
        assert_eq!(run(&toks(&["1", "/", "(", "2", "+", "2", ")"])), Ok(0.25));
    }

    #[test]
    fn sibling_scopes_are_shielded_while_the_inner_one_collapses() {
        assert_eq!(
            run(&toks(&["(", "1", "+", "2", ")", "*", "(", "3", "+", "4", ")"])),
            Ok(21.0)
        );
    }

    #[test]
    fn adjacency_implies_multiplication() {
        assert_eq!(run(&toks(&["2", "(", "3", "+", "4", ")"])), Ok(14.0));
        // synthetic -1 next to an operand, as the negative resolver emits
        assert_eq!(run(&toks(&["2", "*", "-1", "3"])), Ok(-6.0));
    }

    #[test]
    fn empty_sequence_has_no_result() {
        assert_eq!(run(&[]), Err(EvalError::MalformedExpression));
    }

    #[test]
    fn unresolvable_sequence_runs_out_of_fuel() {
        // a dangling operator can never reduce the stacks to one number
        assert_eq!(run(&toks(&["1", "+"])), Err(EvalError::Divergence));
    }

    #[test]
    fn fuel_is_charged_per_visited_operator() {
        // n same-priority operators cost one sweep of n steps at each of
        // the three priority levels, so 16 fit the budget and 17 do not
        fn chain(ones: usize) -> Vec<Token> {
            let mut tokens = vec![Token::from("1")];
            for _ in 1..ones {
                tokens.push(Token::from("+"));
                tokens.push(Token::from("1"));
            }
            tokens
        }

        assert_eq!(run(&chain(17)), Ok(17.0));
        assert_eq!(run(&chain(18)), Err(EvalError::Divergence));
    }

    #[test]
    fn division_by_zero_is_a_result_not_an_error() {
        assert_eq!(run(&toks(&["1", "/", "0"])), Ok(Number::INFINITY));
    }
}

// SPDX: CC0-1.0

use crate::lex::Token;
use anyhow::Context;
use core::fmt;
use std::io::{self, stdin, BufRead, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetExpr,
    Eval,
    Plot,
    SetWin,
    PrintTokens,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetExpr,
            Self::Eval,
            Self::Plot,
            Self::SetWin,
            Self::PrintTokens,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetExpr => "set the expression to graph",
            Self::Eval => "evaluate the expression at one value of x",
            Self::Plot => "plot the expression over the window",
            Self::SetWin => "set window parameters",
            Self::PrintTokens => "print the normalized token sequence (for debugging)",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetExpr => "set",
            Self::Eval => "eval",
            Self::Plot => "plot",
            Self::SetWin => "window",
            Self::PrintTokens => "tokens",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

// nearest command by name, for "did you mean" on typos
pub fn suggest(input: &str) -> Option<Command> {
    let best = Command::exhaustive()
        .iter()
        .map(|c| {
            (
                strsim::normalized_damerau_levenshtein(input, c.name()),
                *c,
            )
        })
        .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc });
    match best {
        Some((similarity, cmd)) if similarity > 0.3 => Some(cmd),
        _ => None,
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = input(&mut out, prompt)?;
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &input, 0, input.len())?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, src: &str, start: usize, len: usize) -> io::Result<()> {
    writeln!(out, "{src}")?;
    writeln!(out, "{}{}", " ".repeat(start), "^".repeat(len.max(1)))?;
    Ok(())
}

pub fn dump_tokens<W: Write>(
    mut out: W,
    tokens: &[Token],
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if tokens.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for token in tokens {
        writeln!(out, "  {token}")?;
    }
    Ok(())
}

pub fn expr_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no expression is defined")
}

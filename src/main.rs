// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU16;
use curve_plot::{
    evaluate, normalize, sample,
    shell::{self, Command},
    EvalError, Number, Point, Window,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
};

const OUTPUT_RES: [u32; 2] = [1920, 1080];

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn output_gnuplot_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "gnuplot"
    )
}

fn output_data_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "data"
    )
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    expr: Option<String>,
    win: Window,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        expr: Some(String::from("x^2")),
        win: Window {
            x: -25.0..25.0,
            y: -25.0..25.0,
            density: 25.try_into().unwrap(),
        },
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        if let Some(ref expr) = state.expr {
            writeln!(stdout, "y = {expr}")?;
        } else {
            writeln!(stdout, "y is not set")?;
        }

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetExpr => set_expr(&mut stdout, &mut state)?,

                Command::Eval => eval_expr(&mut stdout, &state)?,

                Command::Plot => plot_expr(&mut stdout, &mut state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::PrintTokens => print_tokens(&mut stdout, &state)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
            if let Some(near) = shell::suggest(&try_cmd) {
                writeln!(stdout, "note: command '{}' has a similar name", near.name())?;
            }
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "y = ")?;
    if input.is_empty() {
        return Ok(());
    }

    state.expr = Some(input);
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {:#}", state.win)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("x min", &mut state.win.x.start),
        ("x max", &mut state.win.x.end),
        ("y min", &mut state.win.y.start),
        ("y max", &mut state.win.y.end),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: density is samples per x unit, a nonzero integer")?;
    for (name, dst) in [("density", &mut state.win.density)] {
        match shell::read_fromstr::<_, NonZeroU16>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    Ok(())
}

fn print_tokens<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let Some(ref expr) = state.expr else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };

    match shell::read_fromstr::<_, Number>(&mut out, "?x (blank for 0) = ", true)? {
        Ok(x) => {
            let x = x.unwrap_or(0.0);
            match normalize(expr, x) {
                Ok(tokens) => {
                    shell::dump_tokens(&mut out, &tokens, format_args!("tokens at x = {x}"))?;
                }
                Err(err) => report_invalid(&mut out, expr, &err)?,
            }
        }
        Err(_) => {}
    }

    Ok(())
}

fn eval_expr<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let Some(ref expr) = state.expr else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };

    match shell::read_fromstr::<_, Number>(&mut out, "?x = ", false)? {
        Ok(Some(x)) => match evaluate(expr, x) {
            Ok(y) => {
                writeln!(out, "y = {y}")?;
                if !y.is_finite() {
                    writeln!(out, "note: the curve is undefined at this point")?;
                }
            }
            Err(err) => report_invalid(&mut out, expr, &err)?,
        },
        Ok(None) | Err(_) => {}
    }

    Ok(())
}

fn plot_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(ref expr) = state.expr else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };

    // evaluate once per sample before touching the filesystem
    let series = match sample(|x| evaluate(expr, x), &state.win) {
        Ok(series) => series,
        Err(err) => {
            report_invalid(&mut out, expr, &err)?;
            return Ok(());
        }
    };
    writeln!(out, "evaluation ok")?;

    // set up gnuplot
    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }
    let now = Local::now();
    let data_path = output_data_filename(now);
    let gnuplot_path = output_gnuplot_filename(now);
    let svg_path = output_svg_filename(now);
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );
    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    // one block per run; the blank line between blocks breaks the drawn
    // line at each discontinuity
    for (i, run) in series.iter().enumerate() {
        if i > 0 {
            writeln!(data).context("failed to write to output data file")?;
        }
        for Point { x, y } in run {
            writeln!(data, "{x} {y}").context("failed to write to output data file")?;
        }
    }
    data.flush()?;
    data.get_mut().sync_data()?;
    drop(data);

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    let [width, height] = OUTPUT_RES;
    writeln!(gnuplot, "set terminal svg size {width},{height} enhanced")?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    let win = &state.win;
    writeln!(
        gnuplot,
        "set xrange[{min}:{max}]",
        min = win.x.start,
        max = win.x.end
    )?;
    writeln!(
        gnuplot,
        "set yrange[{min}:{max}]",
        min = win.y.start,
        max = win.y.end
    )?;

    writeln!(gnuplot, r#"set title "{data_path}""#)?;
    writeln!(gnuplot, "set title noenhanced")?;

    writeln!(gnuplot, r#"set xlabel "x""#)?;
    writeln!(gnuplot, r#"set ylabel "y""#)?;
    writeln!(gnuplot, "set tics out nomirror")?;

    writeln!(gnuplot, "set key out vertical top right")?;
    writeln!(gnuplot, r#"set key title "Key""#)?;

    writeln!(gnuplot, r#"plot '{data_path}' \"#)?;
    writeln!(gnuplot, r#"  using 1:2 with lines \"#)?;
    writeln!(gnuplot, r#"  title "y = {expr}" noenhance"#)?;

    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${{PATH}}?)")?;

    state.gnuplot = Some(child);

    Ok(())
}

// the caller-facing failure is deliberately uniform; the notes only hint at
// what to look for
fn report_invalid<W: Write>(mut out: W, expr: &str, err: &EvalError) -> anyhow::Result<()> {
    writeln!(out, "Not a valid equation.")?;

    match *err {
        EvalError::InvalidCharacter { at, chr } => {
            writeln!(out)?;
            shell::underline(&mut out, expr, at, chr.len_utf8())?;
            writeln!(out, "note: accepted characters are 0-9 ( ) * / - + . ^ x")?;
            if chr.is_ascii_alphabetic() {
                writeln!(out, "note: the only variable is 'x'")?;
            }
        }

        EvalError::UnbalancedParentheses => {
            writeln!(out, "note: every '(' needs a matching ')'")?;
        }

        EvalError::MalformedDecimal => {
            writeln!(out, "note: a decimal point must be followed by digits")?;
        }

        EvalError::Divergence | EvalError::MalformedExpression => {}
    }

    Ok(())
}

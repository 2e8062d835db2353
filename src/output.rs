//! Coloured run summaries for the terminal

use crate::engine::{Level, Outcome, RunReport};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub const DRY_RUN_NOTICE: &str = "DRY RUN : No changes have been made to the filesystem";

/// Print every outcome of `report` to stdout.
///
/// `verbose` of 1 shows empty-index warnings, 2 also prints the content of
/// each generated index.
pub fn print_report(report: &RunReport, color: bool, verbose: u8) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_report(&mut stdout, report, verbose)
}

pub fn write_report<W: WriteColor>(out: &mut W, report: &RunReport, verbose: u8) -> io::Result<()> {
    let visible: Vec<&Outcome> = report
        .outcomes
        .iter()
        .filter(|o| verbose > 0 || !matches!(o, Outcome::Empty { .. }))
        .collect();

    if report.dry_run && !visible.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(out, "{}", DRY_RUN_NOTICE)?;
        out.reset()?;
    }

    for outcome in visible {
        print_outcome(out, outcome)?;
    }

    if verbose > 1 {
        for write in &report.writes {
            writeln!(out)?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
            writeln!(out, "{}", write.path)?;
            out.reset()?;
            write!(out, "{}", write.content)?;
        }
    }

    out.flush()
}

fn print_outcome<W: WriteColor>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    let (marker, color) = match outcome.level() {
        Level::Success => ("✔", Color::Green),
        Level::Warn => ("⚠", Color::Yellow),
        Level::Error => ("✖", Color::Red),
    };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{} ", marker)?;
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    writeln!(out, "{}", outcome)?;
    out.reset()
}

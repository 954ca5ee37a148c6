//! `mzm-designer`: an interactive terminal editor for MazezaM levels, with a
//! background solver giving live fewest-moves/fewest-pushes/rating feedback
//! and a neighbourhood-search "improver" that hunts for harder nearby levels.

mod app;
mod event;
mod mode;
mod render;
mod rng;
mod solver;
mod tui;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use mzm_core::level_data::LevelData;
use mzm_core::mzm_format::MzmReader;
use mzm_core::types::{MIN_HEIGHT, MIN_WIDTH};

use crate::app::App;

const PROGRAM_NAME: &str = "mzm-designer";
const VERSION: &str = "1.1";
const COPYRIGHT: &str = "(C) 2008 Malcolm Tyrrell";

#[derive(Parser, Debug)]
#[command(name = PROGRAM_NAME, disable_version_flag = true, disable_help_flag = true)]
struct Args {
    /// Output file to append saved levels to (default out.mzm)
    output: Option<PathBuf>,

    /// Print this help message
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Print version information
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Number the first saved level N (default 1)
    #[arg(short = 'l', long = "level-number", value_name = "N")]
    level_number: Option<u64>,

    /// Load the starting level from FILE instead of starting blank
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Disable colour, using plain monochrome rendering
    #[arg(short = 'm', long = "monochrome")]
    monochrome: bool,

    /// Number of solver threads to use (must be at least 2: one for the
    /// background solver, one for the improver)
    #[arg(short = 't', long = "threads", value_name = "NUMTHREADS", default_value_t = 3)]
    threads: u32,
}

fn print_usage(out: &mut impl Write) {
    let _ = writeln!(out, "Usage: {PROGRAM_NAME} [-h|-v| [-l N] [-i infile] [-m] [-t numthreads] [outfile]]");
    let _ = writeln!(out, "Runs an interactive terminal editor for MazezaM levels. Levels saved with 's'");
    let _ = writeln!(out, "are appended to outfile, which defaults to \"out.mzm\".");
}

fn print_help() {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{PROGRAM_NAME} version {VERSION} - an interactive editor for MazezaM levels.");
    let _ = writeln!(out, "{COPYRIGHT}. {PROGRAM_NAME} comes with NO WARRANTY.");
    print_usage(&mut out);
}

fn print_version() {
    println!("{PROGRAM_NAME} version {VERSION} {COPYRIGHT}");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{PROGRAM_NAME}: {message}");
    print_usage(&mut io::stderr());
    std::process::exit(1);
}

fn default_level() -> LevelData {
    LevelData::new(10, 20, 0, 0).expect("default dimensions are always in range")
}

fn load_starting_level(path: &PathBuf) -> Result<(LevelData, u64)> {
    let file = std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut reader = MzmReader::new(std::io::BufReader::new(file), false);
    match reader.next() {
        Ok(true) => {
            let level = reader.get_level().expect("reader just confirmed a level is present").clone();
            Ok((level, reader.get_level_number()))
        }
        Ok(false) => bail!("input file contains no levels"),
        Err(err) => bail!("{err}"),
    }
}

/// The smallest terminal the layout (board + 32-column info panel + title +
/// status bars) can lay out without collapsing.
fn check_terminal_size() -> Result<()> {
    let (columns, rows) = crossterm::terminal::size().context("cannot query terminal size")?;
    let min_columns = MIN_WIDTH as u16 + 2 + 32;
    let min_rows = MIN_HEIGHT as u16 + 2 + 2;
    if columns < min_columns || rows < min_rows {
        bail!("terminal is too small ({columns}x{rows}); need at least {min_columns}x{min_rows}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.help {
        print_help();
        return Ok(());
    }
    if args.version {
        print_version();
        return Ok(());
    }
    if args.threads < 2 {
        usage_error("there must be at least two threads");
    }

    check_terminal_size()?;

    let (level, level_number) = match &args.input {
        Some(path) => load_starting_level(path)?,
        None => (default_level(), 1),
    };
    let level_number = args.level_number.unwrap_or(level_number);
    let output_path = args.output.unwrap_or_else(|| PathBuf::from("out.mzm"));

    let application = App::new(level, level_number, output_path, args.threads as usize, args.monochrome);
    tui::run(application)?;
    Ok(())
}

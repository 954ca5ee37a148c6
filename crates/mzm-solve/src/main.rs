//! `mzm-solve`: batch-solves a stream of `.mzm` levels read from a file or
//! standard input, writing solutions (and, with `-c`, a copy of the input
//! interleaved with them) to a file or standard output.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};
use mzm_core::level_data::LevelData;
use mzm_core::multi_solver::RequestFlags;
use mzm_core::mzm_format::MzmReader;
use mzm_core::offline_solver::OfflineSolver;
use mzm_core::ordered_collector::OrderedCollector;
use mzm_core::range_pred::RangePred;
use mzm_core::search::SearchType;
use mzm_core::worker_pool::WorkerPool;

const PROGRAM_NAME: &str = "mzm-solve";
const VERSION: &str = "1.1";
const COPYRIGHT: &str = "(C) 2008 Malcolm Tyrrell";

/// A couple of small, always-solvable levels, embedded so `-d` works without
/// any filesystem access.
const DEFAULT_LEVELS: &str = "\
######
+ $  *
######
########
+  $ $ *
########
";

#[derive(Parser, Debug)]
#[command(
    name = PROGRAM_NAME,
    disable_version_flag = true,
    disable_help_flag = true,
    group(ArgGroup::new("solution_kind").args(["any_solution", "pushes_only", "moves_only", "both"])),
)]
struct Args {
    /// Input file; reads standard input if omitted
    input: Option<PathBuf>,

    /// Print this help message
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Print version information
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Find any solution
    #[arg(short = 'a', long = "any-solution")]
    any_solution: bool,

    /// Only find the solution with the fewest pushes
    #[arg(short = 'p', long = "pushes-only")]
    pushes_only: bool,

    /// Only find the solution with the fewest moves
    #[arg(short = 'm', long = "moves-only")]
    moves_only: bool,

    /// Give both optimal solutions (default)
    #[arg(short = 'b', long = "both")]
    both: bool,

    /// Copy input to output
    #[arg(short = 'c', long = "copy")]
    copy: bool,

    /// Use built-in default levels instead of a file or standard input
    #[arg(short = 'd', long = "defaults")]
    defaults: bool,

    /// Rate the levels
    #[arg(short = 'r', long = "rating")]
    rating: bool,

    /// Use an A* algorithm
    #[arg(short = 'A', long = "a-star")]
    a_star: bool,

    /// Only solve the specified levels (e.g. `-3,6,9-11,18,24-`)
    #[arg(short = 'l', long = "levels", value_name = "LEVELSPEC")]
    levels: Option<String>,

    /// Write output to FILE instead of standard output
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short = 't', long = "threads", value_name = "NUMTHREADS", default_value_t = 2)]
    threads: u32,
}

fn print_usage(out: &mut impl Write) {
    let _ = writeln!(out, "Usage: {PROGRAM_NAME} [-h|-v| [-a|-m|-p|-b] [-o outfile] [-r] [[-c] [infile] | -d]]");
    let _ = writeln!(out, "If no input file is specified, the program reads from standard input. Input");
    let _ = writeln!(out, "must be in \".mzm\" format.");
}

fn print_examples(out: &mut impl Write) {
    let _ = writeln!(out, "Example: (Copy source.mzm to target.mzm, adding solutions for the specified levels.)");
    let _ = writeln!(out, "$ {PROGRAM_NAME} -l -3,6,9-11,18,24- -c -o target.mzm source.mzm");
}

fn print_help() {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{PROGRAM_NAME} version {VERSION} - a program which solves MazezaM levels.");
    let _ = writeln!(out, "{COPYRIGHT}. {PROGRAM_NAME} comes with NO WARRANTY.");
    print_usage(&mut out);
    print_examples(&mut out);
}

fn print_version() {
    println!("{PROGRAM_NAME} version {VERSION} {COPYRIGHT}");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{PROGRAM_NAME}: {message}");
    print_usage(&mut io::stderr());
    std::process::exit(1);
}

fn request_flags(args: &Args) -> RequestFlags {
    let mut flags = if args.any_solution {
        RequestFlags::FASTEST
    } else if args.pushes_only {
        RequestFlags::PUSHES
    } else if args.moves_only {
        RequestFlags::MOVES
    } else {
        // `-b`, and the default when no solution-kind flag is given.
        RequestFlags::MOVES.union(RequestFlags::PUSHES)
    };
    if args.rating {
        flags = flags.union(RequestFlags::RATING);
    }
    flags
}

fn search_type(args: &Args) -> SearchType {
    if args.a_star { SearchType::AStar } else { SearchType::BreadthFirst }
}

fn run_batch(reader: impl BufRead, range: Option<&RangePred>, out: Box<dyn Write + Send>, args: &Args) -> io::Result<()> {
    let flags = request_flags(args);
    let pool = Arc::new(WorkerPool::new(args.threads.saturating_sub(1) as usize));

    if args.copy {
        // The whole source file is always copied through to the output;
        // `-l`/`range` only decides which of its levels get solved.
        let mut mzm_reader = MzmReader::new(reader, true);
        let mut levels = Vec::new();
        loop {
            match mzm_reader.next() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    eprintln!("{PROGRAM_NAME}: {err}");
                    std::process::exit(1);
                }
            }
            let number = mzm_reader.get_level_number();
            let source = mzm_reader.copy_level();
            let selected = range.is_none_or(|r| r.contains(number));
            levels.push((number, mzm_reader.get_level().unwrap().clone(), source, selected));
        }
        let collector = Arc::new(OrderedCollector::with_copy_mode(out, true));
        let solver = OfflineSolver::with_search_type(pool, collector.clone(), search_type(args));
        let mut sources: HashMap<u64, String> = HashMap::with_capacity(levels.len());
        let numbered_levels: Vec<(u64, LevelData, bool)> = levels
            .into_iter()
            .map(|(number, level, source, selected)| {
                sources.insert(number, source);
                (number, level, selected)
            })
            .collect();
        solver.solve_copying(numbered_levels, flags, |number| {
            if let Some(source) = sources.remove(&number) {
                collector.write_raw(&source);
            }
        });
        return Ok(());
    }

    let mut mzm_reader = MzmReader::new(reader, false);
    let mut levels = Vec::new();
    loop {
        match mzm_reader.next() {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                eprintln!("{PROGRAM_NAME}: {err}");
                std::process::exit(1);
            }
        }
        let number = mzm_reader.get_level_number();
        if range.is_none_or(|r| r.contains(number)) {
            levels.push((number, mzm_reader.get_level().unwrap().clone()));
        }
    }
    let collector = Arc::new(OrderedCollector::new(out));
    let solver = OfflineSolver::with_search_type(pool, collector, search_type(args));
    solver.solve_batch(levels, flags);
    Ok(())
}

fn open_output(args: &Args) -> Box<dyn Write + Send> {
    match &args.output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(f),
            Err(err) => {
                eprintln!("{PROGRAM_NAME}: cannot open output file {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => Box::new(io::stdout()),
    }
}

fn main() {
    let args = Args::parse();

    if args.help {
        print_help();
        return;
    }
    if args.version {
        print_version();
        return;
    }

    if args.defaults && args.input.is_some() {
        usage_error("cannot have -d and an input file");
    }
    if args.defaults && args.copy {
        usage_error("cannot copy built-in defaults");
    }
    if args.threads < 1 {
        usage_error("there must be at least one thread");
    }

    let range = match &args.levels {
        Some(spec) => match RangePred::parse(spec) {
            Ok(r) => Some(r),
            Err(err) => usage_error(&err.to_string()),
        },
        None => None,
    };

    let out = open_output(&args);

    let result = if args.defaults {
        run_batch(io::Cursor::new(DEFAULT_LEVELS.as_bytes()), range.as_ref(), out, &args)
    } else if let Some(path) = &args.input {
        match File::open(path) {
            Ok(f) => run_batch(BufReader::new(f), range.as_ref(), out, &args),
            Err(err) => {
                eprintln!("{PROGRAM_NAME}: cannot open input file {}: {err}", path.display());
                std::process::exit(1);
            }
        }
    } else {
        run_batch(io::stdin().lock(), range.as_ref(), out, &args)
    };

    if let Err(err) = result {
        eprintln!("{PROGRAM_NAME}: {err}");
        std::process::exit(1);
    }
}

// ell - A small Lisp with a bytecode compiler, tail calls, continuations and channels
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser as CliParser;
use ell_vm::{Options, Runtime, clear_interrupt, interrupt_flag};
use signal_hook::consts::signal::SIGINT;
use signal_hook::flag;
use tracing_subscriber::EnvFilter;

/// Run Ell source files, or start a REPL when none are given.
#[derive(CliParser, Debug)]
#[command(name = "ell", version, about)]
struct Cli {
    /// Enable the optimizing compiler and the fast execution loop
    #[arg(short = 'O', long)]
    optimize: bool,

    /// Log each top-level evaluation and function call
    #[arg(short, long)]
    verbose: bool,

    /// Log every executed instruction
    #[arg(short, long)]
    trace: bool,

    /// Log where errors occur
    #[arg(short, long)]
    debug: bool,

    /// Make set! of an undefined global an error
    #[arg(long)]
    strict_set: bool,

    /// Directory searched by `use` (repeatable)
    #[arg(short = 'p', long = "path", value_name = "DIR")]
    module_path: Vec<PathBuf>,

    /// Source files to run in order
    files: Vec<PathBuf>,
}

impl Cli {
    fn options(&self) -> Options {
        let mut module_path = self.module_path.clone();
        module_path.push(PathBuf::from("."));
        Options {
            optimize: self.optimize,
            verbose: self.verbose,
            trace: self.trace,
            debug: self.debug,
            strict_set: self.strict_set,
            module_path,
            ..Options::default()
        }
    }

    fn log_filter(&self) -> EnvFilter {
        let level = if self.trace {
            "trace"
        } else if self.verbose || self.debug {
            "debug"
        } else {
            "warn"
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = flag::register(SIGINT, interrupt_flag()) {
        eprintln!("failed to register SIGINT handler: {}", err);
    }

    let mut runtime = Runtime::new(cli.options());
    if cli.files.is_empty() {
        run_repl(&mut runtime);
    } else {
        run_files(&mut runtime, &cli.files);
    }
}

/// Evaluate each file in turn, exiting on the first error.
fn run_files(runtime: &mut Runtime, files: &[PathBuf]) {
    for path in files {
        tracing::debug!(path = %path.display(), "running file");
        if let Err(e) = runtime.load_file(path) {
            eprintln!("{}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_repl(runtime: &mut Runtime) {
    println!("Ell {}", env!("CARGO_PKG_VERSION"));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("? ");
        if io::stdout().flush().is_err() {
            break;
        }
        let input = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("read error: {}", e);
                break;
            }
            None => {
                println!();
                break;
            }
        };
        if input.trim().is_empty() {
            continue;
        }

        // A ^C typed while idle should not cancel the next evaluation.
        clear_interrupt();
        match runtime.eval_str(&input) {
            Ok(value) => println!("= {}", value),
            Err(e) => eprintln!("{}", e),
        }
    }
}

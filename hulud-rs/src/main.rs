use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hulud::config::LOG_VAR;
use hulud::{argv, Config, Outcome, Shell};

/// hulud - runs commands with `<`, `>`, `>>`, a single `|` and trailing `&`
#[derive(Parser, Debug)]
#[command(name = "hulud", version)]
struct Args {
    /// Execute the given command line and exit
    #[arg(short = 'c')]
    command: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn run_line(shell: &mut Shell, line: &str) -> Outcome {
    let argv = argv::tokenize(line);
    if argv.is_empty() {
        return Outcome::NotApplicable;
    }
    shell.dispatch(&argv)
}

fn run_stdin(shell: &mut Shell) -> Result<Outcome> {
    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let mut last = Outcome::NotApplicable;
    let mut line = String::new();
    loop {
        if interactive {
            print!("{}", shell.config().prompt);
            io::stdout().flush()?;
        }
        line.clear();
        if stdin.lock().read_line(&mut line).context("reading command line")? == 0 {
            break;
        }
        match run_line(shell, &line) {
            Outcome::NotApplicable => {}
            outcome => last = outcome,
        }
    }
    if interactive {
        println!();
    }
    Ok(last)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let mut shell = Shell::new(Config::from_env());

    let last = match args.command {
        Some(line) => run_line(&mut shell, &line),
        None => run_stdin(&mut shell)?,
    };
    io::stdout().flush()?;
    std::process::exit(if last == Outcome::Failure { 1 } else { 0 });
}

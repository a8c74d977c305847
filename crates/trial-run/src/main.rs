use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    run::{self, RunArgs},
    select::{self, SelectArgs},
    sequence::{self, SequenceArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "trial-run", version, about = "Seeded trial sequencing CLI")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a sequence matrix and print it as JSON.
    Sequence(SequenceArgs),
    /// Resolve a row selection against a table length.
    Select(SelectArgs),
    /// Drive every loop of a YAML run plan and write one JSON line per trial.
    Run(RunArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Sequence(args) => sequence::run(&args),
        Command::Select(args) => select::run(&args),
        Command::Run(args) => run::run(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! ttt5 - Q-learning toolkit for 5x5 Tic-Tac-Toe
//!
//! - Train agents against random or self-play opponents
//! - Evaluate saved agents with greedy play
//! - Play against an agent or watch it play itself
//! - Inspect learned Q-tables

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tictactoe5::cli::commands::{evaluate, inspect, play, train};
use tracing::{Level, debug};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "ttt5")]
#[command(version, about = "Tabular Q-learning for 5x5 Tic-Tac-Toe", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v = INFO, -vv = DEBUG, -vvv = TRACE)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-learning agent
    Train(Box<train::TrainArgs>),

    /// Evaluate a trained agent against an opponent
    Evaluate(evaluate::EvaluateArgs),

    /// Play against a trained agent or watch it play itself
    Play(play::PlayArgs),

    /// Inspect a trained agent's Q-table
    Inspect(inspect::InspectArgs),
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = log_level(cli.verbose);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
    debug!("Logging initialized at level: {}", level);

    match cli.command {
        Commands::Train(args) => train::execute(*args),
        Commands::Evaluate(args) => evaluate::execute(args),
        Commands::Play(args) => play::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
    }
}

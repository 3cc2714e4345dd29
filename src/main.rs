//! Soko CLI - play, replay, and analyze box-pushing games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Soko - a concurrent Sokoban engine with deterministic replay
#[derive(Parser, Debug)]
#[command(name = "soko")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a map interactively in the terminal
    Play {
        /// Map file (first line: undo budget, then the grid)
        #[arg(required = true)]
        map: std::path::PathBuf,

        /// What to do when a move is rejected
        #[arg(long, value_enum, default_value = "continue")]
        on_failure: cli::FailureArg,
    },

    /// Replay recorded action files against a map
    Replay {
        /// Map file
        #[arg(required = true)]
        map: std::path::PathBuf,

        /// Action files, one per player (first line: player letter)
        #[arg(required = true, num_args = 1..)]
        actions: Vec<std::path::PathBuf>,

        /// Scheduling discipline across action files
        #[arg(short, long, value_enum, default_value = "free-race")]
        mode: cli::ModeArg,

        /// Rendering frame rate (frames per second)
        #[arg(short, long, default_value = "60")]
        fps: u32,

        /// Output format for the final summary
        #[arg(long, value_enum, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress frame-by-frame board output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Watch a replay live in a TUI
    Watch {
        /// Map file
        #[arg(required = true)]
        map: std::path::PathBuf,

        /// Action files, one per player (first line: player letter)
        #[arg(required = true, num_args = 1..)]
        actions: Vec<std::path::PathBuf>,

        /// Scheduling discipline across action files
        #[arg(short, long, value_enum, default_value = "round-robin")]
        mode: cli::ModeArg,

        /// Rendering frame rate (frames per second)
        #[arg(short, long, default_value = "30")]
        fps: u32,
    },

    /// Run a replay many times in parallel and aggregate the outcomes
    Check {
        /// Map file
        #[arg(required = true)]
        map: std::path::PathBuf,

        /// Action files, one per player (first line: player letter)
        #[arg(required = true, num_args = 1..)]
        actions: Vec<std::path::PathBuf>,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        runs: u64,

        /// Scheduling discipline across action files
        #[arg(short, long, value_enum, default_value = "free-race")]
        mode: cli::ModeArg,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Validate a map file and report its contents
    Validate {
        /// Map file to validate
        #[arg(required = true)]
        map: std::path::PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Play { map, on_failure } => cli::play::execute(&map, on_failure),

        Commands::Replay {
            map,
            actions,
            mode,
            fps,
            format,
            quiet,
        } => cli::replay::execute(&map, &actions, mode, fps, format, quiet),

        Commands::Watch {
            map,
            actions,
            mode,
            fps,
        } => cli::watch::execute(&map, &actions, mode, fps),

        Commands::Check {
            map,
            actions,
            runs,
            mode,
            threads,
            format,
            progress,
        } => cli::check::execute(&map, &actions, runs, mode, threads, format, progress),

        Commands::Validate { map } => cli::validate::execute(&map),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

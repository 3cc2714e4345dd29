//! Check command implementation - repeated parallel replays.
//!
//! Replays the same recordings many times and aggregates the outcomes.
//! Useful for free-race recordings, where the cross-player interleaving is
//! scheduler-dependent: a recording that only sometimes wins shows up here
//! as a win rate below 100%.

use super::output::{CheckStats, format_check_text};
use super::{CliError, ModeArg, OutputFormat, load_board, load_recording};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use soko::engine::{InputEngine, RecordedInputEngine, RenderingEngine};
use soko::game::GameState;
use soko::replay::ReplayGame;
use soko::{GameBoard, ReplayError};
use std::path::{Path, PathBuf};

/// A renderer that drops everything; check runs only need terminal states.
#[derive(Debug, Clone, Copy, Default)]
struct SilentRenderer;

impl RenderingEngine for SilentRenderer {
    fn render(&mut self, _state: &GameState) {}

    fn message(&mut self, _text: &str) {}
}

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded, any run hits a contract
/// fault, or the thread pool cannot be built.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    map: &Path,
    actions: &[PathBuf],
    runs: u64,
    mode: ModeArg,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    let board = load_board(map)?;
    let mut recordings = Vec::with_capacity(actions.len());
    for path in actions {
        recordings.push(load_recording(path)?);
    }

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = if progress {
        let pb = ProgressBar::new(runs);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs",
                )
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let stats = (0..runs)
        .into_par_iter()
        .map(|_| {
            let outcome = run_once(&board, &recordings, mode);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            outcome
        })
        .try_fold(CheckStats::default, |mut stats, outcome| {
            let state = outcome?;
            stats.record(&state);
            Ok::<CheckStats, ReplayError>(stats)
        })
        .try_reduce(CheckStats::default, |a, b| Ok(a.merged(b)))
        .map_err(|e| CliError::new(format!("Replay failed: {e}")))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match format {
        OutputFormat::Text => print!("{}", format_check_text(&stats)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| CliError::new(format!("Failed to serialize stats: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn run_once(
    board: &GameBoard,
    recordings: &[RecordedInputEngine],
    mode: ModeArg,
) -> Result<GameState, ReplayError> {
    let sources: Vec<Box<dyn InputEngine + Send>> = recordings
        .iter()
        .map(|recording| Box::new(recording.clone()) as Box<dyn InputEngine + Send>)
        .collect();
    let game = ReplayGame::new(
        mode.into(),
        soko::DEFAULT_FRAME_RATE,
        GameState::new(board),
        sources,
        Box::new(SilentRenderer),
    )?;
    game.run()
}

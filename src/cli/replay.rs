//! Replay command implementation.

use super::output::{JsonReplaySummary, format_summary_text};
use super::{CliError, ModeArg, OutputFormat, load_board, load_recording};
use soko::engine::{InputEngine, RenderingEngine};
use soko::game::GameState;
use soko::replay::ReplayGame;
use soko::terminal::TerminalRenderingEngine;
use std::io;
use std::path::{Path, PathBuf};

/// A renderer that swallows frames but keeps failure messages on stderr.
#[derive(Debug, Clone, Copy, Default)]
struct QuietRenderer;

impl RenderingEngine for QuietRenderer {
    fn render(&mut self, _state: &GameState) {}

    fn message(&mut self, text: &str) {
        eprintln!("{text}");
    }
}

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the map or a recording cannot be loaded, or the
/// replay hits a contract fault.
pub(crate) fn execute(
    map: &Path,
    actions: &[PathBuf],
    mode: ModeArg,
    fps: u32,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let board = load_board(map)?;

    let mut sources: Vec<Box<dyn InputEngine + Send>> = Vec::with_capacity(actions.len());
    for path in actions {
        sources.push(Box::new(load_recording(path)?));
    }

    let renderer: Box<dyn RenderingEngine + Send> = if quiet {
        Box::new(QuietRenderer)
    } else {
        Box::new(TerminalRenderingEngine::new(io::stdout()))
    };

    let game = ReplayGame::new(mode.into(), fps, GameState::new(&board), sources, renderer)?;
    let terminal = game.run()?;

    match format {
        OutputFormat::Text => print!("{}", format_summary_text(&terminal)),
        OutputFormat::Json => {
            let summary = JsonReplaySummary::from_state(&terminal);
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::new(format!("Failed to serialize summary: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}

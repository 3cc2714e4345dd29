//! Interactive play command implementation.

use super::{CliError, FailureArg, load_board};
use soko::game::GameState;
use soko::terminal::{FailurePolicy, TerminalGame, TerminalInputEngine, TerminalRenderingEngine};
use std::io;
use std::path::Path;

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the map cannot be loaded or the game hits a
/// contract fault.
pub(crate) fn execute(map: &Path, on_failure: FailureArg) -> Result<(), CliError> {
    let board = load_board(map)?;
    let policy = match on_failure {
        FailureArg::Continue => FailurePolicy::Continue,
        FailureArg::Halt => FailurePolicy::Halt,
    };

    let input = TerminalInputEngine::new(io::stdin().lock(), board.player_ids());
    let renderer = TerminalRenderingEngine::new(io::stdout());
    let mut game = TerminalGame::new(GameState::new(&board), input, renderer, policy);

    game.run()?;
    Ok(())
}

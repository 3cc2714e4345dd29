//! Interactive terminal play.
//!
//! Everything here is injected: the input engine reads from any
//! [`BufRead`] and the renderer writes to any [`Write`], so whole games
//! are scriptable in tests without touching real stdio.

use std::io::{BufRead, Write};

use crate::engine::{InputEngine, RenderingEngine};
use crate::error::GameError;
use crate::game::{
    Action, ActionResult, Direction, Entity, GameState, PlayerId, Position, process_action,
};

/// What an interactive game does when an action comes back rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Report the reason and keep playing.
    #[default]
    Continue,
    /// Report the reason and end the game.
    Halt,
}

/// An input engine reading keyboard commands line by line.
///
/// `W`/`A`/`S`/`D` move the first player and `K`/`H`/`J`/`L` the second
/// (both sets drive the first in a single-player game); `R` undoes for the
/// first player and `U` for the second; `exit` quits. End of input also
/// quits. Unrecognized lines become [`Action::InvalidInput`].
pub struct TerminalInputEngine<R> {
    reader: R,
    players: Vec<PlayerId>,
}

impl<R> std::fmt::Debug for TerminalInputEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalInputEngine")
            .field("players", &self.players)
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> TerminalInputEngine<R> {
    /// Create an engine reading from `reader` and driving `players` (the
    /// board's player ids, in order).
    #[must_use]
    pub fn new(reader: R, players: Vec<PlayerId>) -> Self {
        Self { reader, players }
    }

    fn first(&self) -> PlayerId {
        self.players.first().copied().unwrap_or(0)
    }

    /// The second player when there are two, else the first.
    fn second(&self) -> PlayerId {
        self.players.get(1).copied().unwrap_or_else(|| self.first())
    }
}

impl<R: BufRead> InputEngine for TerminalInputEngine<R> {
    fn fetch_action(&mut self) -> Action {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => return Action::Exit(self.first()),
            Ok(_) => {}
        }
        let command = line.trim();
        if command.eq_ignore_ascii_case("exit") {
            return Action::Exit(self.first());
        }
        match command.to_ascii_uppercase().as_str() {
            "W" => Action::Move(Direction::Up, self.first()),
            "A" => Action::Move(Direction::Left, self.first()),
            "S" => Action::Move(Direction::Down, self.first()),
            "D" => Action::Move(Direction::Right, self.first()),
            "K" => Action::Move(Direction::Up, self.second()),
            "H" => Action::Move(Direction::Left, self.second()),
            "J" => Action::Move(Direction::Down, self.second()),
            "L" => Action::Move(Direction::Right, self.second()),
            "R" => Action::Undo(self.first()),
            "U" => Action::Undo(self.second()),
            _ => Action::InvalidInput(self.first(), "Invalid input.".to_string()),
        }
    }
}

/// A rendering engine that writes the board as text.
pub struct TerminalRenderingEngine<W> {
    writer: W,
}

impl<W> std::fmt::Debug for TerminalRenderingEngine<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalRenderingEngine")
            .finish_non_exhaustive()
    }
}

impl<W: Write> TerminalRenderingEngine<W> {
    /// Create an engine writing to `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Take the writer back, e.g. to inspect captured output in tests.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// The display glyph for a cell.
#[must_use]
pub fn cell_glyph(state: &GameState, position: Position) -> char {
    match state.entity(position) {
        Entity::Wall => '#',
        Entity::Player(id) => char::from(b'A' + id),
        Entity::Box(id) => char::from(b'a' + id),
        Entity::Empty => {
            if state.destinations().contains(&position) {
                '@'
            } else {
                '.'
            }
        }
    }
}

impl<W: Write> RenderingEngine for TerminalRenderingEngine<W> {
    fn render(&mut self, state: &GameState) {
        let quota = state.undo_quota();
        let mut text = if quota < 0 {
            "Undo Quota: unlimited\n".to_string()
        } else {
            format!("Undo Quota: {quota}\n")
        };
        for y in 0..state.height() {
            for x in 0..state.width() {
                text.push(cell_glyph(state, Position::new(x, y)));
            }
            text.push('\n');
        }
        // stdio going away mid-game is not worth tearing the game down
        let _ = writeln!(self.writer, "{text}");
    }

    fn message(&mut self, text: &str) {
        let _ = writeln!(self.writer, "{text}");
    }
}

/// A box-pushing game played interactively on one thread.
pub struct TerminalGame<I, R> {
    state: GameState,
    input: I,
    renderer: R,
    on_failure: FailurePolicy,
}

impl<I, R> std::fmt::Debug for TerminalGame<I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalGame")
            .field("on_failure", &self.on_failure)
            .finish_non_exhaustive()
    }
}

impl<I: InputEngine, R: RenderingEngine> TerminalGame<I, R> {
    /// Create a game over `state` with injected engines.
    #[must_use]
    pub fn new(state: GameState, input: I, renderer: R, on_failure: FailurePolicy) -> Self {
        Self {
            state,
            input,
            renderer,
            on_failure,
        }
    }

    /// The current game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Give the engines back, e.g. to inspect captured output in tests.
    #[must_use]
    pub fn into_engines(self) -> (I, R) {
        (self.input, self.renderer)
    }

    /// Play until the game is won, dead, exited, or (under
    /// [`FailurePolicy::Halt`]) an action fails.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownPlayer`] when the input engine produces
    /// an action for a player that is not on the board.
    pub fn run(&mut self) -> Result<(), GameError> {
        self.renderer.message("Game started.");
        self.renderer.render(&self.state);
        while !self.state.is_win() && !self.state.is_stuck() {
            let action = self.input.fetch_action();
            if matches!(action, Action::Exit(_)) {
                self.renderer.message("Game exits.");
                return Ok(());
            }
            match process_action(&mut self.state, &action)? {
                ActionResult::Success(_) => {}
                ActionResult::Failed(_, reason) => {
                    self.renderer.message(&reason);
                    if self.on_failure == FailurePolicy::Halt {
                        break;
                    }
                }
            }
            self.renderer.render(&self.state);
        }
        if self.state.is_win() {
            self.renderer.message("You win.");
        } else if self.state.is_stuck() {
            self.renderer.message("You lose.");
        } else {
            self.renderer.message("Exit unexpectedly.");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameBoard;
    use std::io::Cursor;

    fn game(
        map: &str,
        script: &str,
        on_failure: FailurePolicy,
    ) -> TerminalGame<TerminalInputEngine<Cursor<String>>, TerminalRenderingEngine<Vec<u8>>> {
        let board = GameBoard::parse(map).expect("test map parses");
        let input = TerminalInputEngine::new(Cursor::new(script.to_string()), board.player_ids());
        let renderer = TerminalRenderingEngine::new(Vec::new());
        TerminalGame::new(GameState::new(&board), input, renderer, on_failure)
    }

    fn output(game: TerminalGame<impl InputEngine, TerminalRenderingEngine<Vec<u8>>>) -> String {
        let (_, renderer) = game.into_engines();
        String::from_utf8(renderer.into_inner()).expect("utf8 output")
    }

    #[test]
    fn test_play_to_win() {
        let mut game = game(
            "233\n######\n#A.a@#\n#..a@#\n######",
            "D\nD\nA\nS\nD\n",
            FailurePolicy::Continue,
        );

        game.run().expect("known players");

        assert!(game.state().is_win());
        let output = output(game);
        assert!(output.contains("You win."));
        assert!(output.contains("Undo Quota: 233"));
    }

    /// An in-progress map: not won (the destination is open) and not dead
    /// (the box can still be pushed right).
    const NEUTRAL: &str = "0\n######\n#A.a.#\n#...@#\n######";

    #[test]
    fn test_exit_command_quits() {
        let mut game = game(NEUTRAL, "D\nexit\nD\n", FailurePolicy::Continue);

        game.run().expect("known players");

        assert!(!game.state().is_win());
        assert!(output(game).contains("Game exits."));
    }

    #[test]
    fn test_end_of_input_quits() {
        let mut game = game(NEUTRAL, "", FailurePolicy::Continue);

        game.run().expect("known players");

        assert!(output(game).contains("Game exits."));
    }

    #[test]
    fn test_failure_reported_and_play_continues() {
        let mut game = game(NEUTRAL, "W\nD\nexit\n", FailurePolicy::Continue);

        game.run().expect("known players");

        assert_eq!(game.state().player_position(0), Some(Position::new(2, 1)));
        assert!(output(game).contains("You hit a wall."));
    }

    #[test]
    fn test_failure_halts_under_halt_policy() {
        let mut game = game(NEUTRAL, "W\nD\nexit\n", FailurePolicy::Halt);

        game.run().expect("known players");

        // the move after the failure never ran
        assert_eq!(game.state().player_position(0), Some(Position::new(1, 1)));
        assert!(output(game).contains("Exit unexpectedly."));
    }

    #[test]
    fn test_second_player_keys() {
        let mut game = game(
            "0\n#####\n#A.B#\n#.a@#\n#####",
            "J\nexit\n",
            FailurePolicy::Continue,
        );

        game.run().expect("known players");

        assert_eq!(game.state().player_position(1), Some(Position::new(3, 2)));
        assert_eq!(game.state().player_position(0), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_invalid_input_message() {
        let mut game = game(NEUTRAL, "zz\nexit\n", FailurePolicy::Continue);

        game.run().expect("known players");

        assert!(output(game).contains("Invalid input."));
    }

    #[test]
    fn test_losing_game_reports_loss() {
        // pushing the box into the corner leaves it immovable
        let mut game = game(
            "0\n#####\n#A.@#\n#.a.#\n#####",
            "S\nD\n",
            FailurePolicy::Continue,
        );

        game.run().expect("known players");

        assert!(game.state().is_stuck());
        assert!(output(game).contains("You lose."));
    }
}

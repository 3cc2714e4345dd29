//! Input and rendering engine interfaces, plus the recorded-action source
//! that replays feed on.
//!
//! Engines are always injected; nothing in the library touches ambient
//! stdin/stdout.

use std::collections::VecDeque;

use crate::game::{Action, Direction, GameState, PlayerId};

/// A blocking source of actions for one fixed player.
///
/// Contract: the final action a source ever produces is [`Action::Exit`]
/// for its player; schedulers never fetch again after seeing it. A source
/// that never terminates blocks its consumer indefinitely.
pub trait InputEngine {
    /// Fetch the next unprocessed action, blocking until one is available.
    fn fetch_action(&mut self) -> Action;
}

/// A sink for game output.
///
/// Both methods may be invoked from threads the scheduler owns; the
/// scheduler serializes every call under its global lock, so
/// implementations need no locking of their own.
pub trait RenderingEngine {
    /// Draw the current state.
    fn render(&mut self, state: &GameState);

    /// Show a status or error line.
    fn message(&mut self, text: &str);
}

/// An input engine that replays a pre-recorded action sequence.
///
/// The terminating [`Action::Exit`] is appended when the recording does not
/// already end with one, and is repeated should anything fetch past it.
#[derive(Debug, Clone)]
pub struct RecordedInputEngine {
    player: PlayerId,
    actions: VecDeque<Action>,
}

impl RecordedInputEngine {
    /// Create a source replaying `actions` for `player`.
    #[must_use]
    pub fn new(player: PlayerId, actions: Vec<Action>) -> Self {
        let mut actions: VecDeque<Action> = actions.into();
        if !matches!(actions.back(), Some(Action::Exit(_))) {
            actions.push_back(Action::Exit(player));
        }
        Self { player, actions }
    }

    /// Parse a recording: one command per line.
    ///
    /// `W`/`A`/`S`/`D` move up/left/down/right, `R` or `U` undo, `exit`
    /// stops the recording; matching is case-insensitive and blank lines
    /// are skipped. Anything else becomes an [`Action::InvalidInput`],
    /// which surfaces as a message when processed.
    #[must_use]
    pub fn parse(player: PlayerId, text: &str) -> Self {
        let mut actions = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            actions.push(parse_command(player, line));
            if matches!(actions.last(), Some(Action::Exit(_))) {
                break;
            }
        }
        Self::new(player, actions)
    }

    /// The player this source produces actions for.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Number of actions left in the recording, including the final exit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl InputEngine for RecordedInputEngine {
    fn fetch_action(&mut self) -> Action {
        self.actions
            .pop_front()
            .unwrap_or_else(|| Action::Exit(self.player))
    }
}

fn parse_command(player: PlayerId, line: &str) -> Action {
    if line.eq_ignore_ascii_case("exit") {
        return Action::Exit(player);
    }
    let direction = match line {
        "W" | "w" => Some(Direction::Up),
        "A" | "a" => Some(Direction::Left),
        "S" | "s" => Some(Direction::Down),
        "D" | "d" => Some(Direction::Right),
        _ => None,
    };
    if let Some(direction) = direction {
        return Action::Move(direction, player);
    }
    if matches!(line, "R" | "r" | "U" | "u") {
        return Action::Undo(player);
    }
    Action::InvalidInput(player, format!("Invalid input: {line}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_appends_exit() {
        let mut source = RecordedInputEngine::new(2, vec![Action::Undo(2)]);

        assert_eq!(source.fetch_action(), Action::Undo(2));
        assert_eq!(source.fetch_action(), Action::Exit(2));
        // fetching past the end keeps signalling exit
        assert_eq!(source.fetch_action(), Action::Exit(2));
    }

    #[test]
    fn test_parse_commands() {
        let mut source = RecordedInputEngine::parse(0, "W\ns\nA\nd\nR\nu\nexit\n");

        assert_eq!(source.fetch_action(), Action::Move(Direction::Up, 0));
        assert_eq!(source.fetch_action(), Action::Move(Direction::Down, 0));
        assert_eq!(source.fetch_action(), Action::Move(Direction::Left, 0));
        assert_eq!(source.fetch_action(), Action::Move(Direction::Right, 0));
        assert_eq!(source.fetch_action(), Action::Undo(0));
        assert_eq!(source.fetch_action(), Action::Undo(0));
        assert_eq!(source.fetch_action(), Action::Exit(0));
    }

    #[test]
    fn test_parse_skips_blank_lines_and_flags_garbage() {
        let mut source = RecordedInputEngine::parse(1, "\n  \nW\nbogus\n");

        assert_eq!(source.fetch_action(), Action::Move(Direction::Up, 1));
        assert!(matches!(
            source.fetch_action(),
            Action::InvalidInput(1, message) if message.contains("bogus")
        ));
        assert_eq!(source.fetch_action(), Action::Exit(1));
    }

    #[test]
    fn test_parse_stops_at_exit() {
        let source = RecordedInputEngine::parse(0, "exit\nW\nS\n");
        assert_eq!(source.remaining(), 1);
    }
}

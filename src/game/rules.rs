//! The action processor: validates and applies player actions.

use crate::error::GameError;
use crate::game::{Direction, Entity, GameState, PlayerId, Position};

/// An action performed by a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the initiating player one step.
    Move(Direction, PlayerId),
    /// Revert to the previous checkpoint.
    Undo(PlayerId),
    /// Stop playing; interpreted by the caller as a termination signal for
    /// this initiator.
    Exit(PlayerId),
    /// Input that could not be understood, with a description of why.
    InvalidInput(PlayerId, String),
}

impl Action {
    /// The id of the player who initiated this action.
    #[must_use]
    pub const fn initiator(&self) -> PlayerId {
        match self {
            Action::Move(_, id)
            | Action::Undo(id)
            | Action::Exit(id)
            | Action::InvalidInput(id, _) => *id,
        }
    }
}

/// The outcome of processing a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// The action was applied to the state.
    Success(Action),
    /// The action was rejected; the state is unchanged.
    Failed(Action, String),
}

impl ActionResult {
    fn failed(action: &Action, reason: &str) -> Self {
        ActionResult::Failed(action.clone(), reason.to_string())
    }
}

/// Apply `action` to `state`.
///
/// Recoverable rejections (blocked moves, exhausted undo quota, invalid
/// input) come back as [`ActionResult::Failed`] and leave the state
/// untouched.
///
/// # Errors
///
/// Returns [`GameError::UnknownPlayer`] when a `Move` names a player absent
/// from the board; this is a contract fault in the caller's wiring, not a
/// gameplay failure.
pub fn process_action(state: &mut GameState, action: &Action) -> Result<ActionResult, GameError> {
    match action {
        Action::InvalidInput(_, message) => Ok(ActionResult::failed(action, message)),
        Action::Exit(_) => Ok(ActionResult::Success(action.clone())),
        Action::Undo(_) => {
            if state.undo_quota() == 0 {
                Ok(ActionResult::failed(action, "no more undo quota"))
            } else {
                state.undo();
                Ok(ActionResult::Success(action.clone()))
            }
        }
        Action::Move(direction, player) => {
            let position = state
                .player_position(*player)
                .ok_or(GameError::UnknownPlayer(*player))?;
            Ok(one_step_move(state, action, position, *direction))
        }
    }
}

/// Apply a single-step move of the player standing at `player`.
fn one_step_move(
    state: &mut GameState,
    action: &Action,
    player: Position,
    direction: Direction,
) -> ActionResult {
    let target = player.step(direction);
    match state.entity(target) {
        Entity::Empty => {
            state.apply_move(player, target);
            ActionResult::Success(action.clone())
        }
        Entity::Wall => ActionResult::failed(action, "You hit a wall."),
        Entity::Player(_) => ActionResult::failed(action, "You hit another player."),
        Entity::Box(_) => {
            let beyond = target.step(direction);
            if state.entity(beyond) != Entity::Empty {
                return ActionResult::failed(action, "Failed to push the box.");
            }
            state.apply_move(target, beyond);
            state.apply_move(player, target);
            // every step that relocates a box commits one checkpoint
            state.checkpoint();
            ActionResult::Success(action.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameBoard;

    fn state(text: &str) -> GameState {
        GameState::new(&GameBoard::parse(text).expect("test map parses"))
    }

    fn assert_failed(result: &ActionResult, reason: &str) {
        match result {
            ActionResult::Failed(_, r) => assert_eq!(r, reason),
            ActionResult::Success(_) => panic!("expected failure: {reason}"),
        }
    }

    #[test]
    fn test_invalid_input_fails_with_message() {
        let mut state = state("0\n###\n#A#\n###");
        let action = Action::InvalidInput(0, "Invalid input.".to_string());

        let result = process_action(&mut state, &action).expect("known player");

        assert_failed(&result, "Invalid input.");
    }

    #[test]
    fn test_exit_always_succeeds() {
        let mut state = state("0\n###\n#A#\n###");
        let result = process_action(&mut state, &Action::Exit(0)).expect("known player");
        assert_eq!(result, ActionResult::Success(Action::Exit(0)));
    }

    #[test]
    fn test_move_into_empty_cell() {
        let mut state = state("0\n####\n#A.#\n####");

        let result =
            process_action(&mut state, &Action::Move(Direction::Right, 0)).expect("known player");

        assert!(matches!(result, ActionResult::Success(_)));
        assert_eq!(state.player_position(0), Some(Position::new(2, 1)));
    }

    #[test]
    fn test_move_into_wall_fails() {
        let mut state = state("0\n####\n#A.#\n####");

        let result =
            process_action(&mut state, &Action::Move(Direction::Up, 0)).expect("known player");

        assert_failed(&result, "You hit a wall.");
        assert_eq!(state.player_position(0), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_move_into_player_fails() {
        let mut state = state("0\n####\n#AB#\n####");

        let result =
            process_action(&mut state, &Action::Move(Direction::Right, 0)).expect("known player");

        assert_failed(&result, "You hit another player.");
        assert_eq!(state.player_position(0), Some(Position::new(1, 1)));
        assert_eq!(state.player_position(1), Some(Position::new(2, 1)));
    }

    #[test]
    fn test_push_box_commits_one_checkpoint() {
        let mut state = state("233\n#####\n#Aa.#\n#####");

        let result =
            process_action(&mut state, &Action::Move(Direction::Right, 0)).expect("known player");

        assert!(matches!(result, ActionResult::Success(_)));
        assert_eq!(state.player_position(0), Some(Position::new(2, 1)));
        assert_eq!(state.entity(Position::new(3, 1)), Entity::Box(0));
        assert_eq!(state.checkpoints(), 1);
    }

    #[test]
    fn test_blocked_push_fails_without_side_effects() {
        let mut state = state("233\n#####\n#Aab#\n#####");

        let result =
            process_action(&mut state, &Action::Move(Direction::Right, 0)).expect("known player");

        assert_failed(&result, "Failed to push the box.");
        assert_eq!(state.entity(Position::new(2, 1)), Entity::Box(0));
        assert_eq!(state.entity(Position::new(3, 1)), Entity::Box(1));
        assert_eq!(state.checkpoints(), 0);
    }

    #[test]
    fn test_undo_with_zero_quota_fails() {
        let mut state = state("0\n####\n#A.#\n####");
        process_action(&mut state, &Action::Move(Direction::Right, 0)).expect("known player");

        let result = process_action(&mut state, &Action::Undo(0)).expect("known player");

        assert_failed(&result, "no more undo quota");
        assert_eq!(state.player_position(0), Some(Position::new(2, 1)));
    }

    #[test]
    fn test_undo_reverts_push_and_charges_quota() {
        let mut state = state("233\n#####\n#Aa.#\n#####");
        process_action(&mut state, &Action::Move(Direction::Right, 0)).expect("known player");

        let result = process_action(&mut state, &Action::Undo(0)).expect("known player");

        assert!(matches!(result, ActionResult::Success(_)));
        assert_eq!(state.player_position(0), Some(Position::new(1, 1)));
        assert_eq!(state.entity(Position::new(2, 1)), Entity::Box(0));
        assert_eq!(state.undo_quota(), 232);
    }

    #[test]
    fn test_unknown_player_is_a_contract_fault() {
        let mut state = state("0\n###\n#A#\n###");

        let result = process_action(&mut state, &Action::Move(Direction::Up, 9));

        assert_eq!(result, Err(GameError::UnknownPlayer(9)));
    }

    #[test]
    fn test_win_scenario_with_undo() {
        let mut state = state("233\n######\n#A.a@#\n#..a@#\n######");
        let moves = [
            Direction::Right,
            Direction::Right, // pushes the top box onto its destination
            Direction::Left,
            Direction::Down,
            Direction::Right, // pushes the bottom box onto its destination
        ];
        for direction in moves {
            let result =
                process_action(&mut state, &Action::Move(direction, 0)).expect("known player");
            assert!(matches!(result, ActionResult::Success(_)), "{direction:?}");
        }
        assert!(state.is_win());

        process_action(&mut state, &Action::Undo(0)).expect("known player");

        assert!(!state.is_win());
        assert_eq!(state.entity(Position::new(3, 2)), Entity::Box(0));
        assert_eq!(state.entity(Position::new(4, 2)), Entity::Empty);
        assert_eq!(state.undo_quota(), 232);
    }
}

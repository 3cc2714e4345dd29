#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soko::game::{Action, Direction, Entity, GameBoard, GameState, Position, process_action};

/// Structured input for action fuzzing.
#[derive(Arbitrary, Debug)]
struct ActionInput {
    /// Encoded actions: player bit plus an action kind.
    steps: Vec<(bool, u8)>,
}

const ARENA: &str = "3\n########\n#A.a...#\n#..b.B.#\n#.a..b.#\n#...@@.#\n########";

fuzz_target!(|input: ActionInput| {
    let board = GameBoard::parse(ARENA).expect("arena parses");
    let mut state = GameState::new(&board);
    let walls = count_walls(&state);

    for (second_player, kind) in input.steps.iter().take(512) {
        let player = u8::from(*second_player);
        let action = match kind % 6 {
            0 => Action::Move(Direction::Up, player),
            1 => Action::Move(Direction::Down, player),
            2 => Action::Move(Direction::Left, player),
            3 => Action::Move(Direction::Right, player),
            4 => Action::Undo(player),
            _ => Action::InvalidInput(player, "fuzz".to_string()),
        };
        process_action(&mut state, &action).expect("players exist");

        // walls are immovable and the quota can never go negative
        assert_eq!(count_walls(&state), walls);
        assert!(state.undo_quota() >= 0);
    }
});

fn count_walls(state: &GameState) -> usize {
    let mut walls = 0;
    for y in 0..state.height() {
        for x in 0..state.width() {
            if state.entity(Position::new(x, y)) == Entity::Wall {
                walls += 1;
            }
        }
    }
    walls
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use soko::game::{GameBoard, GameState};

fuzz_target!(|text: &str| {
    // Parsing arbitrary text must never panic; any accepted board must
    // yield a usable session.
    if let Ok(board) = GameBoard::parse(text) {
        let state = GameState::new(&board);
        let _ = state.is_win();
        let _ = state.is_stuck();
        assert!(board.width() > 0);
        assert!(board.height() > 0);
        assert!(!board.player_ids().is_empty());
    }
});

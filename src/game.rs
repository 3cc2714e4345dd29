//! Game layer for Soko.
//!
//! Implements the box-pushing rules:
//! - Board model parsed from map text (walls, boxes, players, destinations,
//!   undo budget)
//! - Per-session mutable game state with a transactional checkpoint/undo
//!   history
//! - The action processor shared by interactive play and replays

mod board;
mod rules;
mod state;

pub use board::{Direction, Entity, GameBoard, PlayerId, Position};
pub use rules::{Action, ActionResult, process_action};
pub use state::GameState;

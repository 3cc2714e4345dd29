// Allow unwrap and panicking asserts in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Soko: a concurrent multi-player Sokoban engine with deterministic replay.
//!
//! This crate provides a box-pushing game engine designed around:
//! - A transactional game state: every box push commits a checkpoint, and a
//!   bounded undo quota rolls checkpoints back.
//! - Replays driven by one recorded action stream per player, executed by
//!   one thread per stream against the shared board.
//! - Two scheduling disciplines: strict round-robin rotation or a free
//!   race for the state lock.
//! - A render thread pacing frames independently of action throughput.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      Replay Scheduler / TUI         │
//! ├─────────────────────────────────────┤
//! │   Action Processor (game rules)     │
//! ├─────────────────────────────────────┤
//! │   Game State (board + history)      │
//! └─────────────────────────────────────┘
//! ```

pub mod engine;
pub mod error;
pub mod game;
pub mod replay;
pub mod terminal;

pub use engine::{InputEngine, RecordedInputEngine, RenderingEngine};
pub use error::{BoardError, GameError, ReplayError};

// Re-export key game types at crate root for convenience
pub use game::{
    Action, ActionResult, Direction, Entity, GameBoard, GameState, PlayerId, Position,
    process_action,
};
pub use replay::{DEFAULT_FRAME_RATE, Mode, ReplayGame};

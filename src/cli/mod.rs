//! CLI command implementations for Soko.

pub(crate) mod check;
pub(crate) mod play;
pub(crate) mod replay;
pub(crate) mod validate;
pub(crate) mod watch;

mod output;

use clap::ValueEnum;
use soko::{GameBoard, Mode, PlayerId, RecordedInputEngine};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Output format for the `replay` and `check` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Scheduling discipline argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Strict rotating turn order across the action files.
    RoundRobin,
    /// All action files race for the board.
    FreeRace,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::RoundRobin => Mode::RoundRobin,
            ModeArg::FreeRace => Mode::FreeRace,
        }
    }
}

/// Failure handling argument for interactive play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FailureArg {
    /// Report rejected moves and keep playing.
    Continue,
    /// End the game on the first rejected move.
    Halt,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<soko::BoardError> for CliError {
    fn from(e: soko::BoardError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<soko::ReplayError> for CliError {
    fn from(e: soko::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<soko::GameError> for CliError {
    fn from(e: soko::GameError) -> Self {
        Self::new(e.to_string())
    }
}

/// Load and parse a board file.
pub(crate) fn load_board(path: &Path) -> Result<GameBoard, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    GameBoard::parse(&text)
        .map_err(|e| CliError::new(format!("Invalid map {}: {e}", path.display())))
}

/// Load one recorded action file.
///
/// The first non-blank line names the player letter (`A`-`Z`); the rest
/// are commands, one per line.
pub(crate) fn load_recording(path: &Path) -> Result<RecordedInputEngine, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    let mut lines = text.lines();
    let player = loop {
        let Some(line) = lines.next() else {
            return Err(CliError::new(format!(
                "{}: missing player letter line",
                path.display()
            )));
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        break parse_player_letter(line).ok_or_else(|| {
            CliError::new(format!(
                "{}: expected a player letter A-Z, got {line:?}",
                path.display()
            ))
        })?;
    };
    let rest: String = lines.collect::<Vec<_>>().join("\n");
    Ok(RecordedInputEngine::parse(player, &rest))
}

fn parse_player_letter(line: &str) -> Option<PlayerId> {
    let bytes = line.as_bytes();
    if bytes.len() == 1 && bytes[0].is_ascii_uppercase() {
        Some(bytes[0] - b'A')
    } else {
        None
    }
}

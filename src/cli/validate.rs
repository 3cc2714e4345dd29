//! Map validation command implementation.

use super::{CliError, load_board};
use soko::game::{Entity, GameState};
use std::path::Path;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the map cannot be read or fails validation.
pub(crate) fn execute(map: &Path) -> Result<(), CliError> {
    let board = load_board(map)?;

    println!("Validating: {}", map.display());
    println!();

    let boxes = board
        .entities()
        .filter(|(_, entity)| matches!(entity, Entity::Box(_)))
        .count();
    let walls = board
        .entities()
        .filter(|(_, entity)| matches!(entity, Entity::Wall))
        .count();
    let players = board.player_ids();

    println!("Summary:");
    println!("  Size:         {}x{}", board.width(), board.height());
    println!(
        "  Players:      {}",
        players
            .iter()
            .map(|id| char::from(b'A' + id).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Boxes:        {boxes}");
    println!("  Destinations: {}", board.destinations().len());
    println!("  Walls:        {walls}");
    let budget = board.undo_budget();
    if budget < 0 {
        println!("  Undo budget:  unlimited");
    } else {
        println!("  Undo budget:  {budget}");
    }

    if boxes != board.destinations().len() {
        println!();
        println!("Note: box and destination counts differ; the map cannot be fully solved.");
    }
    let state = GameState::new(&board);
    if state.is_stuck() {
        println!();
        println!("Note: no box is reachably movable from the starting position.");
    }

    println!();
    println!("Validation successful!");

    Ok(())
}

//! Board model: positions, entities, and the immutable level description.

use std::collections::{HashMap, HashSet};

use crate::error::BoardError;

/// Unique identifier for a player.
///
/// Map letters `A`-`Z` produce ids 0-25; a box letter `a`-`z` names its
/// owning player the same way.
pub type PlayerId = u8;

/// A cell coordinate, origin at the top-left corner of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Horizontal displacement (column).
    pub x: i32,
    /// Vertical displacement (row).
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring position one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A unit movement on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards smaller y.
    Up,
    /// Towards larger y.
    Down,
    /// Towards smaller x.
    Left,
    /// Towards larger x.
    Right,
}

impl Direction {
    /// All four directions, in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The (dx, dy) offset of this direction; y grows downward.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// The occupant of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// Nothing; cells with no recorded entity are implicitly empty.
    Empty,
    /// An immovable wall.
    Wall,
    /// A player avatar.
    Player(PlayerId),
    /// A box owned by the player with the matching letter.
    Box(PlayerId),
}

/// An immutable level description.
///
/// A board is parsed once and never mutated afterwards; any number of game
/// sessions ([`crate::game::GameState`]) can be derived from one board.
#[derive(Debug, Clone, PartialEq)]
pub struct GameBoard {
    width: i32,
    height: i32,
    undo_budget: i32,
    placement: HashMap<Position, Entity>,
    destinations: HashSet<Position>,
}

impl GameBoard {
    /// Parse a board from its text form.
    ///
    /// The first line holds the undo budget (`-1` for unlimited). The
    /// remaining lines are grid rows: `#` is a wall, `@` a box destination,
    /// `A`-`Z` a player, `a`-`z` a box owned by the corresponding player,
    /// and anything else floor.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] when the text has no grid rows, the undo
    /// budget line is missing, malformed, or below -1, a player letter
    /// repeats, or no player exists.
    pub fn parse(text: &str) -> Result<Self, BoardError> {
        let mut lines = text.lines();
        let budget_line = lines.next().ok_or(BoardError::EmptyMap)?;
        let undo_budget: i32 = budget_line
            .trim()
            .parse()
            .map_err(|_| BoardError::InvalidUndoBudget(budget_line.to_string()))?;
        if undo_budget < -1 {
            return Err(BoardError::UndoBudgetOutOfRange(undo_budget));
        }

        let mut placement = HashMap::new();
        let mut destinations = HashSet::new();
        let mut players = HashSet::new();
        let mut width = 0;
        let mut height = 0;

        for (y, line) in lines.enumerate() {
            for (x, c) in line.bytes().enumerate() {
                let position = Position::new(to_i32(x), to_i32(y));
                let entity = match c {
                    b'#' => Entity::Wall,
                    b'@' => {
                        destinations.insert(position);
                        width = width.max(position.x + 1);
                        height = height.max(position.y + 1);
                        continue;
                    }
                    b'A'..=b'Z' => {
                        let id = c - b'A';
                        if !players.insert(id) {
                            return Err(BoardError::DuplicatePlayer(id));
                        }
                        Entity::Player(id)
                    }
                    b'a'..=b'z' => Entity::Box(c - b'a'),
                    _ => continue,
                };
                placement.insert(position, entity);
                width = width.max(position.x + 1);
                height = height.max(position.y + 1);
            }
        }

        if placement.is_empty() {
            return Err(BoardError::EmptyMap);
        }
        if players.is_empty() {
            return Err(BoardError::NoPlayer);
        }

        Ok(Self {
            width,
            height,
            undo_budget,
            placement,
            destinations,
        })
    }

    /// Horizontal extent of the board.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Vertical extent of the board.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// The undo budget a session starts with; negative means unlimited.
    #[must_use]
    pub const fn undo_budget(&self) -> i32 {
        self.undo_budget
    }

    /// The entity initially occupying `position` (`Empty` when nothing is).
    #[must_use]
    pub fn entity(&self, position: Position) -> Entity {
        self.placement
            .get(&position)
            .copied()
            .unwrap_or(Entity::Empty)
    }

    /// The set of box destinations.
    #[must_use]
    pub fn destinations(&self) -> &HashSet<Position> {
        &self.destinations
    }

    /// Iterate over every initially occupied cell.
    #[must_use]
    pub fn entities(&self) -> impl Iterator<Item = (Position, Entity)> + '_ {
        self.placement.iter().map(|(p, e)| (*p, *e))
    }

    /// Ids of all players on the board, in ascending order.
    #[must_use]
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .placement
            .values()
            .filter_map(|entity| match entity {
                Entity::Player(id) => Some(*id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Grid indices come from enumerating map lines and never approach i32::MAX.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn to_i32(index: usize) -> i32 {
    index as i32
}

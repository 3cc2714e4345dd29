//! Per-session mutable game state with a transactional undo history.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::game::{Direction, Entity, GameBoard, PlayerId, Position};

/// The original-position → current-position remaps accumulated since the
/// last checkpoint.
///
/// Moving an entity that is already tracked updates its existing entry, so
/// a transition always holds one entry per entity, keyed by where that
/// entity stood when the transition began. Reversing a transition therefore
/// restores every entity to its checkpoint-time cell in one step, no matter
/// how many hops it took since.
#[derive(Debug, Clone, Default, PartialEq)]
struct Transition {
    moves: HashMap<Position, Position>,
}

impl Transition {
    fn record(&mut self, from: Position, to: Position) {
        let tracked = self
            .moves
            .iter()
            .find_map(|(origin, current)| (*current == from).then_some(*origin));
        self.moves.insert(tracked.unwrap_or(from), to);
    }
}

/// The mutable state of one game session.
///
/// Created from a [`GameBoard`] and mutated exclusively through
/// [`apply_move`](GameState::apply_move),
/// [`checkpoint`](GameState::checkpoint), and [`undo`](GameState::undo).
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    width: i32,
    height: i32,
    entities: HashMap<Position, Entity>,
    destinations: HashSet<Position>,
    undo_quota: i32,
    current: Transition,
    history: Vec<Transition>,
}

impl GameState {
    /// Start a new session from a board.
    #[must_use]
    pub fn new(board: &GameBoard) -> Self {
        Self {
            width: board.width(),
            height: board.height(),
            entities: board.entities().collect(),
            destinations: board.destinations().clone(),
            undo_quota: board.undo_budget(),
            current: Transition::default(),
            history: Vec::new(),
        }
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

    /// The set of box destinations.
    #[must_use]
    pub fn destinations(&self) -> &HashSet<Position> {
        &self.destinations
    }

    /// Remaining undo quota; negative means unlimited.
    #[must_use]
    pub const fn undo_quota(&self) -> i32 {
        self.undo_quota
    }

    /// Number of committed checkpoints on the history stack.
    #[must_use]
    pub fn checkpoints(&self) -> usize {
        self.history.len()
    }

    /// The entity occupying `position` (`Empty` when nothing is there).
    #[must_use]
    pub fn entity(&self, position: Position) -> Entity {
        self.entities
            .get(&position)
            .copied()
            .unwrap_or(Entity::Empty)
    }

    /// Locate a player by id.
    #[must_use]
    pub fn player_position(&self, id: PlayerId) -> Option<Position> {
        self.entities.iter().find_map(|(position, entity)| {
            matches!(entity, Entity::Player(p) if *p == id).then_some(*position)
        })
    }

    /// Relocate the entity at `from` to `to`, overwriting whatever was
    /// there, and record the move in the current transition.
    ///
    /// Legality is the caller's concern; the action processor validates
    /// before calling. Moving from an empty cell is a no-op.
    pub fn apply_move(&mut self, from: Position, to: Position) {
        let Some(entity) = self.entities.remove(&from) else {
            return;
        };
        self.entities.insert(to, entity);
        self.current.record(from, to);
    }

    /// Commit the current transition to the history stack and start a new
    /// empty one.
    ///
    /// Called by the action processor exactly once per step in which a box
    /// was relocated.
    pub fn checkpoint(&mut self) {
        let committed = std::mem::take(&mut self.current);
        self.history.push(committed);
    }

    /// Roll back the most recent activity.
    ///
    /// First the uncommitted transition is reversed and discarded; then, if
    /// the history stack is non-empty, the most recent checkpoint is popped
    /// and reversed, which costs one unit of a limited quota. Undoing only
    /// uncommitted moves is free. Callers must check the quota before
    /// calling; the quota being exactly zero forbids the call.
    pub fn undo(&mut self) {
        let current = std::mem::take(&mut self.current);
        self.apply_reversed(&current);
        if let Some(committed) = self.history.pop() {
            self.apply_reversed(&committed);
            if self.undo_quota > 0 {
                self.undo_quota -= 1;
            }
        }
    }

    /// Send every entity tracked by `transition` back to its origin cell.
    ///
    /// All current cells are vacated before any origin is refilled so that
    /// overlapping remaps (an entity restored onto a cell another entity is
    /// leaving) cannot clobber each other.
    fn apply_reversed(&mut self, transition: &Transition) {
        let mut restored = Vec::with_capacity(transition.moves.len());
        for (origin, current) in &transition.moves {
            if let Some(entity) = self.entities.remove(current) {
                restored.push((*origin, entity));
            }
        }
        for (origin, entity) in restored {
            self.entities.insert(origin, entity);
        }
    }

    /// True when every destination cell holds a box.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.destinations
            .iter()
            .all(|position| matches!(self.entity(*position), Entity::Box(_)))
    }

    /// Conservative deadlock check.
    ///
    /// Breadth-first search from every player position through empty and
    /// player-occupied cells, bounded by the board rectangle. A box reached
    /// by the search counts as movable when the cell one step beyond it in
    /// the approach direction is empty or holds a player. The game is
    /// reported stuck only when no reachable box is movable.
    ///
    /// This is a heuristic, not a solvability proof: a neighbouring
    /// player's cell counts as push room even when that player can never
    /// vacate it, so some multi-player corner deadlocks go undetected.
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        let mut frontier: VecDeque<Position> = self
            .entities
            .iter()
            .filter(|(_, entity)| matches!(entity, Entity::Player(_)))
            .map(|(position, _)| *position)
            .collect();
        let mut visited: HashSet<Position> = frontier.iter().copied().collect();

        while let Some(position) = frontier.pop_front() {
            for direction in Direction::ALL {
                let next = position.step(direction);
                if !self.in_bounds(next) || visited.contains(&next) {
                    continue;
                }
                match self.entity(next) {
                    Entity::Empty | Entity::Player(_) => {
                        visited.insert(next);
                        frontier.push_back(next);
                    }
                    Entity::Box(_) => {
                        let beyond = next.step(direction);
                        if matches!(
                            self.entity(beyond),
                            Entity::Empty | Entity::Player(_)
                        ) {
                            return false;
                        }
                    }
                    Entity::Wall => {}
                }
            }
        }
        true
    }

    const fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0 && position.x < self.width && position.y >= 0 && position.y < self.height
    }
}

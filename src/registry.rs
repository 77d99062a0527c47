//! Live boards of one peer, keyed by board id.

use std::collections::BTreeMap;

use tracing::debug;

use crate::game::{Board, BoardId, Position};

/// Owns every board a peer knows about.
#[derive(Debug, Clone, Default)]
pub struct BoardRegistry {
    boards: BTreeMap<BoardId, Board>,
}

impl BoardRegistry {
    pub fn new() -> Self {
        BoardRegistry::default()
    }

    /// The smallest id not in use.
    pub fn next_id(&self) -> BoardId {
        let mut next = 0;
        for id in self.boards.keys() {
            if id.0 != next {
                break;
            }
            next += 1;
        }
        BoardId(next)
    }

    /// Creates a board under a fresh id.
    pub fn create(&mut self, position: Position) -> BoardId {
        let id = self.next_id();
        let mut board = Board::new(id);
        board.set_position(position);
        debug!(board = %id, "board created");
        self.boards.insert(id, board);
        id
    }

    /// Returns the board with `id`, creating an idle one if unknown.
    pub fn get_or_create(&mut self, id: BoardId) -> &mut Board {
        self.boards.entry(id).or_insert_with(|| {
            debug!(board = %id, "board created from sync");
            Board::new(id)
        })
    }

    pub fn remove(&mut self, id: BoardId) -> Option<Board> {
        let removed = self.boards.remove(&id);
        if removed.is_some() {
            debug!(board = %id, "board removed");
        }
        removed
    }

    pub fn get(&self, id: BoardId) -> Option<&Board> {
        self.boards.get(&id)
    }

    pub fn get_mut(&mut self, id: BoardId) -> Option<&mut Board> {
        self.boards.get_mut(&id)
    }

    /// Board ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = BoardId> + '_ {
        self.boards.keys().copied()
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.boards.values()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

//! Board coordinates.
//!
//! A tile is an `(x, y)` pair on the 8x8 grid. Construction is bounds-checked,
//! so holding a `Tile` means holding an in-bounds coordinate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of tiles along each edge of the board.
pub const BOARD_SIZE: u8 = 8;

/// Raised when a coordinate pair falls outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tile ({x}, {y}) is out of bounds")]
pub struct TileOutOfBounds {
    pub x: i32,
    pub y: i32,
}

/// An in-bounds board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct Tile {
    x: u8,
    y: u8,
}

impl Tile {
    /// Returns the tile at `(x, y)`, or `None` when it is off the board.
    pub fn new(x: i32, y: i32) -> Option<Tile> {
        if Tile::in_bounds(x, y) {
            Some(Tile { x: x as u8, y: y as u8 })
        } else {
            None
        }
    }

    /// Returns the tile nearest to `(x, y)`, clamping each axis to `[0, 8)`.
    ///
    /// Used at the hit-testing boundary where pointer positions may land on
    /// the board rim.
    pub fn clamped(x: i32, y: i32) -> Tile {
        let max = BOARD_SIZE as i32 - 1;
        Tile {
            x: x.clamp(0, max) as u8,
            y: y.clamp(0, max) as u8,
        }
    }

    /// Whether `(x, y)` lies on the board.
    pub fn in_bounds(x: i32, y: i32) -> bool {
        let size = BOARD_SIZE as i32;
        (0..size).contains(&x) && (0..size).contains(&y)
    }

    pub const fn x(self) -> u8 {
        self.x
    }

    pub const fn y(self) -> u8 {
        self.y
    }

    /// Steps `(dx, dy)` away from this tile, if the result is on the board.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Tile> {
        Tile::new(self.x as i32 + dx, self.y as i32 + dy)
    }

    /// Row-major index in `0..64`.
    pub const fn index(self) -> usize {
        self.y as usize * BOARD_SIZE as usize + self.x as usize
    }

    /// Iterates every tile in row-major order.
    pub fn all() -> impl Iterator<Item = Tile> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Tile { x, y }))
    }
}

impl TryFrom<(i32, i32)> for Tile {
    type Error = TileOutOfBounds;

    fn try_from((x, y): (i32, i32)) -> Result<Self, Self::Error> {
        Tile::new(x, y).ok_or(TileOutOfBounds { x, y })
    }
}

impl From<Tile> for (i32, i32) {
    fn from(tile: Tile) -> Self {
        (tile.x as i32, tile.y as i32)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

//! Board geometry and pieces.
//!
//! Contains the coordinate type, the two teams with their home layout, and
//! the marker records owned by a board's move engine.

pub mod marker;
pub mod team;
pub mod tile;

pub use marker::{Marker, MarkerId, MARKERS_PER_TEAM};
pub use team::{InvalidTeam, Team, ALL_TEAMS};
pub use tile::{Tile, TileOutOfBounds, BOARD_SIZE};

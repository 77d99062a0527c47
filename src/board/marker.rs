//! Markers (checker pieces).
//!
//! Each team owns a fixed pool of markers identified by slot. A slot is never
//! reused: capture takes the marker off the board but keeps its identity.

use std::fmt;

use super::team::Team;
use super::tile::Tile;

/// Markers per team.
pub const MARKERS_PER_TEAM: usize = 12;

/// Stable identity of a marker: its team and slot within the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId {
    pub team: Team,
    pub slot: u8,
}

impl MarkerId {
    /// Returns the id for `(team, slot)`, or `None` when the slot is out of range.
    pub fn new(team: Team, slot: usize) -> Option<MarkerId> {
        if slot < MARKERS_PER_TEAM {
            Some(MarkerId { team, slot: slot as u8 })
        } else {
            None
        }
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.team, self.slot)
    }
}

/// A single marker and its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    /// Current tile; `None` once captured.
    pub tile: Option<Tile>,
    pub captured: bool,
    /// Crowned: may move in both diagonal directions.
    pub enhanced: bool,
}

impl Marker {
    pub fn new(id: MarkerId) -> Self {
        Marker {
            id,
            tile: None,
            captured: false,
            enhanced: false,
        }
    }

    /// Whether the marker is still in play.
    pub fn is_alive(&self) -> bool {
        !self.captured
    }
}

//! Teams and their home layout.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::marker::MARKERS_PER_TEAM;
use super::tile::{Tile, BOARD_SIZE};

/// Raised for a team index other than 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid team index {0}")]
pub struct InvalidTeam(pub u8);

/// One of the two sides of a board.
///
/// Red (team 0) starts on the low rows and moves toward increasing `y`;
/// Blue (team 1) starts on the high rows and moves toward decreasing `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Team {
    Red,
    Blue,
}

/// Both teams in index order.
pub const ALL_TEAMS: [Team; 2] = [Team::Red, Team::Blue];

impl Team {
    pub const fn index(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Team> {
        match index {
            0 => Some(Team::Red),
            1 => Some(Team::Blue),
            _ => None,
        }
    }

    pub const fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Row delta of a forward step for an unenhanced marker.
    pub const fn forward(self) -> i32 {
        match self {
            Team::Red => 1,
            Team::Blue => -1,
        }
    }

    /// The row farthest from this team's start; reaching it enhances a marker.
    pub const fn far_row(self) -> u8 {
        match self {
            Team::Red => BOARD_SIZE - 1,
            Team::Blue => 0,
        }
    }

    /// Display name shown on the board's menu.
    pub const fn name(self) -> &'static str {
        match self {
            Team::Red => "Red",
            Team::Blue => "Blue",
        }
    }

    /// Starting tiles for this team's markers, indexed by slot.
    ///
    /// Fills rows from the team's origin, two columns apart, wrapping to the
    /// next row at the board edge and shifting odd rows one column right.
    pub fn home_tiles(self) -> [Tile; MARKERS_PER_TEAM] {
        let (mut x, mut y): (i32, i32) = match self {
            Team::Red => (0, 0),
            Team::Blue => (1, 5),
        };
        let size = BOARD_SIZE as i32;
        let mut tiles = [Tile::clamped(0, 0); MARKERS_PER_TEAM];
        for tile in tiles.iter_mut() {
            *tile = Tile::clamped(x, y);
            x += 2;
            if x >= size {
                x = 0;
                y += 1;
                if y % 2 == 1 {
                    x += 1;
                }
            }
        }
        tiles
    }
}

impl TryFrom<u8> for Team {
    type Error = InvalidTeam;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Team::from_index(value as usize).ok_or(InvalidTeam(value))
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team.index() as u8
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Board-level session types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::PeerId;

/// Numeric id of a board within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(pub u32);

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for players to register and start.
    Idle,
    /// A game is being played.
    InSession,
    /// The game has finished; the final position stays on the board.
    Completed,
}

impl SessionState {
    /// Returns the single-digit snapshot code.
    pub const fn code(self) -> u8 {
        match self {
            SessionState::Idle => 0,
            SessionState::InSession => 1,
            SessionState::Completed => 2,
        }
    }

    /// Parses a session state from its snapshot code.
    pub fn from_code(code: u8) -> Option<SessionState> {
        match code {
            0 => Some(SessionState::Idle),
            1 => Some(SessionState::InSession),
            2 => Some(SessionState::Completed),
            _ => None,
        }
    }
}

/// A player registered to one team of a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seat {
    pub player_id: PeerId,
    pub display_name: String,
}

/// Scene-space position of a board.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Position { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_code_roundtrip() {
        for s in [SessionState::Idle, SessionState::InSession, SessionState::Completed] {
            assert_eq!(SessionState::from_code(s.code()), Some(s));
        }
        assert_eq!(SessionState::from_code(3), None);
    }

    #[test]
    fn board_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&BoardId(7)).unwrap(), "7");
    }
}

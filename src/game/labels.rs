//! Text pushed to the rendering layer.
//!
//! The renderer shows these strings on the board's menu; it never writes
//! back into game state.

use crate::board::{Team, Tile, ALL_TEAMS, BOARD_SIZE};

use super::machine::Board;
use super::session::SessionState;

/// Menu text for one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLabels {
    /// "Game Open", "Red's Turn", "Blue Wins" or "Game Over".
    pub state: String,
    /// Caption of the start button: "Start", or "End" during play.
    pub start_button: &'static str,
    /// Seated player names per team, "Empty" when vacant.
    pub registry: [String; 2],
    /// "Markers: n" per team.
    pub markers: [String; 2],
}

impl BoardLabels {
    pub fn for_board(board: &Board) -> Self {
        let state = match board.session() {
            SessionState::Idle => "Game Open".to_string(),
            SessionState::InSession => format!("{}'s Turn", board.turn()),
            SessionState::Completed => match board.winner() {
                Some(winner) => format!("{} Wins", winner),
                None => "Game Over".to_string(),
            },
        };
        let start_button = if board.session() == SessionState::InSession {
            "End"
        } else {
            "Start"
        };
        BoardLabels {
            state,
            start_button,
            registry: ALL_TEAMS.map(|t| {
                board
                    .seat(t)
                    .map_or_else(|| "Empty".to_string(), |s| s.display_name.clone())
            }),
            markers: ALL_TEAMS.map(|t| format!("Markers: {}", board.alive_count(t))),
        }
    }
}

/// Character for a tile in the text grid.
fn glyph(board: &Board, tile: Tile) -> char {
    let pieces = board.pieces();
    if let Some(id) = pieces.occupant(tile) {
        let enhanced = pieces.marker(id).enhanced;
        let selected = pieces.selected() == Some(id);
        return match (id.team, enhanced || selected) {
            (Team::Red, false) => 'r',
            (Team::Red, true) => 'R',
            (Team::Blue, false) => 'b',
            (Team::Blue, true) => 'B',
        };
    }
    match pieces.candidate_at(tile) {
        Some(c) if c.is_jump() => 'x',
        Some(_) => '*',
        None => '.',
    }
}

/// Renders the board as text rows, highest row first.
///
/// Uppercase marks a crowned or selected marker; `*` and `x` mark plain and
/// capturing candidates.
pub fn grid_lines(board: &Board) -> Vec<String> {
    (0..BOARD_SIZE as i32)
        .rev()
        .map(|y| {
            let row: String = (0..BOARD_SIZE as i32)
                .filter_map(|x| Tile::new(x, y))
                .map(|t| glyph(board, t))
                .collect();
            format!("{} {}", y, row)
        })
        .collect()
}

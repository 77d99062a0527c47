//! Board snapshot encoding and decoding.
//!
//! A snapshot is the full state of one board, pushed by the trusted source
//! when it establishes itself and whenever a board is created.
//!
//! Metadata: `<session>_<turn>_<id0>_<name0>_<id1>_<name1>_<x>_<y>_<z>`,
//! where an empty seat leaves both its fields empty.
//!
//! Markers, one string per team: twelve `<x>:<y>:<captured>:<enhanced>`
//! records in slot order joined by `_`. Captured markers carry `-1:-1`.
//!
//! The selected tile and the running capture chain travel as typed fields
//! beside the text, so a receiver resumes a half-played turn exactly.

use serde::{Deserialize, Serialize};

use crate::board::{Team, Tile, BOARD_SIZE, MARKERS_PER_TEAM};
use crate::game::{Board, BoardId, BoardState, CaptureChain, Position, Seat, SessionState};
use crate::identity::PeerId;
use crate::movegen::MarkerRecord;

const META_FIELDS: usize = 9;
const BOARD_TILES: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;

/// Wire form of a board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: BoardId,
    pub state: String,
    pub markers: [String; 2],
    #[serde(default)]
    pub selected: Option<Tile>,
    /// Captures made so far in the current chain; zero when none runs.
    #[serde(default)]
    pub chain: u8,
}

/// Errors that can occur while parsing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("expected 9 metadata fields, got {0}")]
    WrongFieldCount(usize),

    #[error("invalid session code: '{0}'")]
    InvalidSession(String),

    #[error("invalid turn: '{0}'")]
    InvalidTurn(String),

    #[error("invalid player id: '{0}'")]
    InvalidPlayer(String),

    #[error("invalid coordinate: '{0}'")]
    InvalidCoordinate(String),

    #[error("{team} has {count} marker records, expected 12")]
    WrongMarkerCount { team: Team, count: usize },

    #[error("invalid marker record: '{0}'")]
    InvalidMarker(String),

    #[error("two markers on tile {0}")]
    Collision(Tile),

    #[error("selected tile {0} is empty")]
    EmptySelection(Tile),

    #[error("capture chain without a selected marker in play")]
    DanglingChain,

    #[error("empty marker record")]
    EmptyRecord,
}

fn flag(b: bool) -> char {
    if b {
        '1'
    } else {
        '0'
    }
}

fn encode_marker(record: &MarkerRecord) -> String {
    let (x, y) = match (record.captured, record.tile) {
        (false, Some(t)) => (t.x() as i32, t.y() as i32),
        _ => (-1, -1),
    };
    format!("{}:{}:{}:{}", x, y, flag(record.captured), flag(record.enhanced))
}

/// Encodes the current state of `board`.
pub fn encode_snapshot(board: &Board) -> BoardSnapshot {
    let state = board.state();
    let mut fields = vec![
        state.session.code().to_string(),
        state.turn.index().to_string(),
    ];
    for seat in &state.seats {
        match seat {
            Some(s) => {
                fields.push(s.player_id.to_string());
                fields.push(s.display_name.clone());
            }
            None => {
                fields.push(String::new());
                fields.push(String::new());
            }
        }
    }
    fields.push(state.position.x.to_string());
    fields.push(state.position.y.to_string());
    fields.push(state.position.z.to_string());

    BoardSnapshot {
        board: board.id(),
        state: fields.join("_"),
        markers: state
            .markers
            .map(|team| team.iter().map(encode_marker).collect::<Vec<_>>().join("_")),
        selected: state.selected,
        chain: state.chain.captures,
    }
}

fn parse_flag(s: &str, record: &str) -> Result<bool, SnapshotError> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(SnapshotError::InvalidMarker(record.to_string())),
    }
}

fn parse_marker(record: &str) -> Result<MarkerRecord, SnapshotError> {
    if record.is_empty() {
        return Err(SnapshotError::EmptyRecord);
    }
    let invalid = || SnapshotError::InvalidMarker(record.to_string());
    let parts: Vec<&str> = record.split(':').collect();
    let [x, y, captured, enhanced] = parts.as_slice() else {
        return Err(invalid());
    };
    let captured = parse_flag(captured, record)?;
    let enhanced = parse_flag(enhanced, record)?;
    if captured {
        return Ok(MarkerRecord {
            tile: None,
            captured: true,
            enhanced,
        });
    }
    let x: i32 = x.parse().map_err(|_| invalid())?;
    let y: i32 = y.parse().map_err(|_| invalid())?;
    let tile = Tile::new(x, y).ok_or_else(invalid)?;
    Ok(MarkerRecord {
        tile: Some(tile),
        captured: false,
        enhanced,
    })
}

fn parse_team_markers(
    team: Team,
    s: &str,
) -> Result<[MarkerRecord; MARKERS_PER_TEAM], SnapshotError> {
    let records = s
        .split('_')
        .map(parse_marker)
        .collect::<Result<Vec<_>, _>>()?;
    let count = records.len();
    records
        .try_into()
        .map_err(|_| SnapshotError::WrongMarkerCount { team, count })
}

fn parse_seat(id: &str, name: &str) -> Result<Option<Seat>, SnapshotError> {
    if id.is_empty() {
        return Ok(None);
    }
    let player_id = PeerId::new(id).map_err(|_| SnapshotError::InvalidPlayer(id.to_string()))?;
    Ok(Some(Seat {
        player_id,
        display_name: name.to_string(),
    }))
}

fn parse_coordinate(s: &str) -> Result<f32, SnapshotError> {
    s.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SnapshotError::InvalidCoordinate(s.to_string()))
}

/// Parses a snapshot into board state.
///
/// Two live markers sharing a tile are rejected here, before any board is
/// touched.
pub fn parse_snapshot(snapshot: &BoardSnapshot) -> Result<BoardState, SnapshotError> {
    let fields: Vec<&str> = snapshot.state.split('_').collect();
    if fields.len() != META_FIELDS {
        return Err(SnapshotError::WrongFieldCount(fields.len()));
    }

    let session = fields[0]
        .parse::<u8>()
        .ok()
        .and_then(SessionState::from_code)
        .ok_or_else(|| SnapshotError::InvalidSession(fields[0].to_string()))?;
    let turn = fields[1]
        .parse::<usize>()
        .ok()
        .and_then(Team::from_index)
        .ok_or_else(|| SnapshotError::InvalidTurn(fields[1].to_string()))?;
    let seats = [
        parse_seat(fields[2], fields[3])?,
        parse_seat(fields[4], fields[5])?,
    ];
    let position = Position::new(
        parse_coordinate(fields[6])?,
        parse_coordinate(fields[7])?,
        parse_coordinate(fields[8])?,
    );
    let markers = [
        parse_team_markers(Team::Red, &snapshot.markers[0])?,
        parse_team_markers(Team::Blue, &snapshot.markers[1])?,
    ];

    let mut seen = [false; BOARD_TILES];
    for tile in markers.iter().flatten().filter_map(|r| r.tile) {
        if std::mem::replace(&mut seen[tile.index()], true) {
            return Err(SnapshotError::Collision(tile));
        }
    }
    if let Some(tile) = snapshot.selected {
        if !seen[tile.index()] {
            return Err(SnapshotError::EmptySelection(tile));
        }
    }
    let chain = CaptureChain {
        active: snapshot.chain > 0,
        captures: snapshot.chain,
    };
    if chain.active && (session != SessionState::InSession || snapshot.selected.is_none()) {
        return Err(SnapshotError::DanglingChain);
    }

    Ok(BoardState {
        session,
        turn,
        seats,
        position,
        markers,
        selected: snapshot.selected,
        chain,
    })
}

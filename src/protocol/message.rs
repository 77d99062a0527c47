//! Typed bus messages and their JSON wire form.
//!
//! Every message travels inside an `Envelope` naming its sender. Fields are
//! validated while deserializing: tiles must be on the board, teams must be
//! 0 or 1 and peer ids must be well formed, so game logic never sees an
//! out-of-range index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{Team, Tile};
use crate::game::BoardId;
use crate::identity::PeerId;

use super::snapshot::BoardSnapshot;

/// Errors from the wire codec.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown topic: '{0}'")]
    UnknownTopic(String),
}

/// A board-scoped action, either a request to the source or its accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardCommand {
    RegisterRequest { display_name: String, team: Team },
    RegisterAccept { player_id: PeerId, display_name: String, team: Team },
    UnregisterAccept { team: Team },
    StartRequest,
    StartAccept,
    RestartRequest,
    RestartAccept,
    SelectRequest { tile: Tile },
    SelectAccept { tile: Tile },
    MoveRequest { tile: Tile },
    MoveAccept { tile: Tile },
}

impl BoardCommand {
    /// True for commands only the trusted source evaluates.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            BoardCommand::RegisterRequest { .. }
                | BoardCommand::StartRequest
                | BoardCommand::RestartRequest
                | BoardCommand::SelectRequest { .. }
                | BoardCommand::MoveRequest { .. }
        )
    }

    /// Short topic code of this command.
    pub fn code(&self) -> &'static str {
        match self {
            BoardCommand::RegisterRequest { .. } => "rur",
            BoardCommand::RegisterAccept { .. } => "rua",
            BoardCommand::UnregisterAccept { .. } => "rura",
            BoardCommand::StartRequest => "sbr",
            BoardCommand::StartAccept => "sba",
            BoardCommand::RestartRequest => "rbr",
            BoardCommand::RestartAccept => "rba",
            BoardCommand::SelectRequest { .. } => "smr",
            BoardCommand::SelectAccept { .. } => "sma",
            BoardCommand::MoveRequest { .. } => "mmr",
            BoardCommand::MoveAccept { .. } => "mma",
        }
    }
}

const BOARD_CODES: [&str; 11] = [
    "rur", "rua", "rura", "sbr", "sba", "rbr", "rba", "smr", "sma", "mmr", "mma",
];

/// A message on the scene bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Asks whoever is the trusted source to announce itself.
    GetSource,
    /// Announces the trusted source. Last one observed wins.
    SyncSource { source: PeerId },
    /// Full state of one board, pushed by the source.
    SyncBoard(BoardSnapshot),
    Board { board: BoardId, command: BoardCommand },
}

impl Message {
    pub fn board(board: BoardId, command: BoardCommand) -> Self {
        Message::Board { board, command }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Message::GetSource => Topic::GetSource,
            Message::SyncSource { .. } => Topic::SyncSource,
            Message::SyncBoard(_) => Topic::SyncBoard,
            Message::Board { board, command } => Topic::Board {
                code: command.code(),
                board: *board,
            },
        }
    }
}

/// Bus topic names, as listed on the scene bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    GetSource,
    SyncSource,
    SyncBoard,
    /// `cb_<code>_<board>`.
    Board { code: &'static str, board: BoardId },
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::GetSource => f.write_str("get_source"),
            Topic::SyncSource => f.write_str("sync_source"),
            Topic::SyncBoard => f.write_str("sync_board"),
            Topic::Board { code, board } => write!(f, "cb_{}_{}", code, board),
        }
    }
}

impl FromStr for Topic {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || WireError::UnknownTopic(s.to_string());
        match s {
            "get_source" => return Ok(Topic::GetSource),
            "sync_source" => return Ok(Topic::SyncSource),
            "sync_board" => return Ok(Topic::SyncBoard),
            _ => {}
        }
        let rest = s.strip_prefix("cb_").ok_or_else(unknown)?;
        let (code, board) = rest.rsplit_once('_').ok_or_else(unknown)?;
        let code = BOARD_CODES
            .into_iter()
            .find(|c| *c == code)
            .ok_or_else(unknown)?;
        let board = board.parse::<u32>().map_err(|_| unknown())?;
        Ok(Topic::Board {
            code,
            board: BoardId(board),
        })
    }
}

/// A message together with the peer that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: PeerId,
    pub message: Message,
}

impl Envelope {
    pub fn new(sender: PeerId, message: Message) -> Self {
        Envelope { sender, message }
    }

    pub fn topic(&self) -> Topic {
        self.message.topic()
    }

    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PeerId {
        PeerId::new("alice").unwrap()
    }

    #[test]
    fn topics_render_bus_names() {
        let select = Message::board(BoardId(3), BoardCommand::SelectRequest {
            tile: Tile::new(0, 2).unwrap(),
        });
        assert_eq!(select.topic().to_string(), "cb_smr_3");
        assert_eq!(
            Message::board(BoardId(0), BoardCommand::UnregisterAccept { team: Team::Blue })
                .topic()
                .to_string(),
            "cb_rura_0"
        );
        assert_eq!(Message::GetSource.topic().to_string(), "get_source");
        assert_eq!(
            Message::SyncSource { source: alice() }.topic().to_string(),
            "sync_source"
        );
    }

    #[test]
    fn topics_parse_back() {
        for name in ["get_source", "sync_source", "sync_board", "cb_rura_12", "cb_mma_0"] {
            let topic: Topic = name.parse().unwrap();
            assert_eq!(topic.to_string(), name);
        }
        assert!("cb_xyz_1".parse::<Topic>().is_err());
        assert!("cb_smr_x".parse::<Topic>().is_err());
        assert!("move".parse::<Topic>().is_err());
    }

    #[test]
    fn envelope_json_shape() {
        let env = Envelope::new(
            alice(),
            Message::board(BoardId(1), BoardCommand::MoveAccept {
                tile: Tile::new(4, 4).unwrap(),
            }),
        );
        let json = env.encode().unwrap();
        assert_eq!(
            json,
            r#"{"sender":"alice","message":{"type":"board","board":1,"command":{"kind":"move_accept","tile":[4,4]}}}"#
        );
        assert_eq!(Envelope::decode(&json).unwrap(), env);
    }

    #[test]
    fn sync_board_carries_snapshot_fields() {
        let env = Envelope::new(
            alice(),
            Message::SyncBoard(BoardSnapshot {
                board: BoardId(0),
                state: "0_0_____0_0_0".to_string(),
                markers: [String::new(), String::new()],
                selected: Some(Tile::new(2, 2).unwrap()),
                chain: 1,
            }),
        );
        let json = env.encode().unwrap();
        assert!(json.contains(r#""type":"sync_board","board":0"#));
        assert!(json.contains(r#""selected":[2,2],"chain":1"#));
        assert_eq!(Envelope::decode(&json).unwrap(), env);

        let bare = r#"{"sender":"alice","message":{"type":"sync_board","board":0,"state":"","markers":["",""]}}"#;
        match Envelope::decode(bare).unwrap().message {
            Message::SyncBoard(s) => assert_eq!((s.selected, s.chain), (None, 0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_out_of_range_fields() {
        let off_board = r#"{"sender":"bob","message":{"type":"board","board":0,"command":{"kind":"select_request","tile":[8,0]}}}"#;
        assert!(Envelope::decode(off_board).is_err());

        let bad_team = r#"{"sender":"bob","message":{"type":"board","board":0,"command":{"kind":"unregister_accept","team":2}}}"#;
        assert!(Envelope::decode(bad_team).is_err());

        let bad_sender = r#"{"sender":"b_b","message":{"type":"get_source"}}"#;
        assert!(Envelope::decode(bad_sender).is_err());

        assert!(matches!(Envelope::decode("not json"), Err(WireError::Json(_))));
    }

    #[test]
    fn request_classification() {
        assert!(BoardCommand::StartRequest.is_request());
        assert!(!BoardCommand::StartAccept.is_request());
        assert!(!BoardCommand::UnregisterAccept { team: Team::Red }.is_request());
    }
}

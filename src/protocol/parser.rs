//! Console command parser.
//!
//! Parses lines read by the console driver into structured `Command`
//! variants that the main loop can dispatch on. Every peer-scoped command
//! names the acting peer first.

use tracing::warn;

use crate::board::{Team, Tile};
use crate::game::BoardId;
use crate::identity::PeerId;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Synchronization ping; the driver replies `readyok`.
    IsReady,

    /// Set an option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Join a peer to the scene: `peer <id> [display name]`.
    Peer { id: PeerId, name: Option<String> },

    /// Advance the scene clock: `advance <ms>`.
    Advance { ms: u64 },

    /// `create <peer>`: the peer asks to create a board.
    Create { peer: PeerId },

    /// `remove <peer> <board>`.
    Remove { peer: PeerId, board: BoardId },

    /// `register <peer> <board> <team> [display name]`.
    Register {
        peer: PeerId,
        board: BoardId,
        team: Team,
        name: Option<String>,
    },

    /// `unregister <peer> <board> <team>`.
    Unregister { peer: PeerId, board: BoardId, team: Team },

    /// `start <peer> <board>`.
    Start { peer: PeerId, board: BoardId },

    /// `restart <peer> <board>`.
    Restart { peer: PeerId, board: BoardId },

    /// `click <peer> <board> <x> <y>`: a raw pointer hit, clamped later.
    Click { peer: PeerId, board: BoardId, x: i32, y: i32 },

    /// `select <peer> <board> <x> <y>`.
    Select { peer: PeerId, board: BoardId, tile: Tile },

    /// `move <peer> <board> <x> <y>`.
    Move { peer: PeerId, board: BoardId, tile: Tile },

    /// `show <peer> <board>`: print the board as the peer sees it.
    Show { peer: PeerId, board: BoardId },

    /// `snapshot <peer> <board>`.
    Snapshot { peer: PeerId, board: BoardId },

    /// `source <peer>`: print the peer's trusted source.
    Source { peer: PeerId },

    /// Terminate the driver.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&head, args) = tokens.split_first()?;

    let parsed = match head {
        "isready" => Ok(Command::IsReady),
        "quit" => Ok(Command::Quit),
        "setoption" => parse_setoption(args),
        "peer" => parse_peer(args),
        "advance" => arg(args, 0, "ms").map(|ms| Command::Advance { ms }),
        "create" => peer_arg(args).map(|peer| Command::Create { peer }),
        "remove" => peer_board(args).map(|(peer, board)| Command::Remove { peer, board }),
        "register" => parse_register(args),
        "unregister" => parse_unregister(args),
        "start" => peer_board(args).map(|(peer, board)| Command::Start { peer, board }),
        "restart" => peer_board(args).map(|(peer, board)| Command::Restart { peer, board }),
        "click" => parse_click(args),
        "select" => peer_board_tile(args).map(|(peer, board, tile)| Command::Select {
            peer,
            board,
            tile,
        }),
        "move" => peer_board_tile(args).map(|(peer, board, tile)| Command::Move {
            peer,
            board,
            tile,
        }),
        "show" => peer_board(args).map(|(peer, board)| Command::Show { peer, board }),
        "snapshot" => peer_board(args).map(|(peer, board)| Command::Snapshot { peer, board }),
        "source" => peer_arg(args).map(|peer| Command::Source { peer }),
        other => {
            warn!(command = other, "unknown command");
            return None;
        }
    };

    match parsed {
        Ok(cmd) => Some(cmd),
        Err(reason) => {
            warn!(command = head, %reason, "malformed command");
            None
        }
    }
}

/// Parses the `index`-th argument, naming `what` on failure.
fn arg<T: std::str::FromStr>(args: &[&str], index: usize, what: &str) -> Result<T, String> {
    let raw = args.get(index).ok_or_else(|| format!("missing {}", what))?;
    raw.parse().map_err(|_| format!("invalid {} '{}'", what, raw))
}

fn peer_at(args: &[&str], index: usize) -> Result<PeerId, String> {
    let raw = args.get(index).ok_or("missing peer id")?;
    PeerId::new(*raw).map_err(|e| e.to_string())
}

fn peer_arg(args: &[&str]) -> Result<PeerId, String> {
    peer_at(args, 0)
}

fn peer_board(args: &[&str]) -> Result<(PeerId, BoardId), String> {
    Ok((peer_at(args, 0)?, BoardId(arg(args, 1, "board id")?)))
}

fn parse_team(args: &[&str], index: usize) -> Result<Team, String> {
    let raw = args.get(index).ok_or("missing team")?;
    match raw.to_ascii_lowercase().as_str() {
        "0" | "red" => Ok(Team::Red),
        "1" | "blue" => Ok(Team::Blue),
        _ => Err(format!("invalid team '{}'", raw)),
    }
}

fn peer_board_tile(args: &[&str]) -> Result<(PeerId, BoardId, Tile), String> {
    let (peer, board) = peer_board(args)?;
    let x: i32 = arg(args, 2, "x")?;
    let y: i32 = arg(args, 3, "y")?;
    let tile = Tile::new(x, y).ok_or_else(|| format!("tile ({}, {}) is off the board", x, y))?;
    Ok((peer, board, tile))
}

/// Joins the arguments from `index` on, if any.
fn rest(args: &[&str], index: usize) -> Option<String> {
    args.get(index..)
        .filter(|r| !r.is_empty())
        .map(|r| r.join(" "))
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(args: &[&str]) -> Result<Command, String> {
    if args.first() != Some(&"name") || args.len() < 2 {
        return Err("expected 'setoption name <id> [value <x>]'".to_string());
    }
    let args = &args[1..];
    let value_idx = args.iter().position(|&t| t == "value");
    let (name_parts, value) = match value_idx {
        Some(vi) => (&args[..vi], rest(args, vi + 1)),
        None => (args, None),
    };
    if name_parts.is_empty() {
        return Err("empty option name".to_string());
    }
    Ok(Command::SetOption {
        name: name_parts.join(" "),
        value,
    })
}

fn parse_peer(args: &[&str]) -> Result<Command, String> {
    Ok(Command::Peer {
        id: peer_arg(args)?,
        name: rest(args, 1),
    })
}

fn parse_register(args: &[&str]) -> Result<Command, String> {
    let (peer, board) = peer_board(args)?;
    Ok(Command::Register {
        peer,
        board,
        team: parse_team(args, 2)?,
        name: rest(args, 3),
    })
}

fn parse_unregister(args: &[&str]) -> Result<Command, String> {
    let (peer, board) = peer_board(args)?;
    Ok(Command::Unregister {
        peer,
        board,
        team: parse_team(args, 2)?,
    })
}

fn parse_click(args: &[&str]) -> Result<Command, String> {
    let (peer, board) = peer_board(args)?;
    Ok(Command::Click {
        peer,
        board,
        x: arg(args, 2, "x")?,
        y: arg(args, 3, "y")?,
    })
}

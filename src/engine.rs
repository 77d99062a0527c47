//! Console driver state.
//!
//! Owns the simulated scene and the option set new peers join with, and
//! turns console commands into peer intents and printed views.

use std::io::{self, Write};
use std::time::Duration;

use tracing::debug;

use crate::board::{Team, Tile, ALL_TEAMS};
use crate::config::{ConfigError, PeerConfig};
use crate::game::{grid_lines, BoardId, BoardLabels};
use crate::identity::{Identity, PeerId};
use crate::net::{Outbox, Peer};
use crate::protocol::encode_snapshot;
use crate::sim::{SimError, Simulation};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("peer '{0}' is not the trusted source")]
    NotSource(PeerId),

    #[error("peer '{peer}' has no board {board}")]
    UnknownBoard { peer: PeerId, board: BoardId },
}

/// Holds the scene between commands.
#[derive(Debug, Default)]
pub struct Engine {
    sim: Simulation,
    config: PeerConfig,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Options peers join with. Peers already in the scene keep theirs.
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        self.config.set_option(name, value)?;
        Ok(())
    }

    /// Joins a peer; the display name defaults to the id.
    pub fn add_peer(&mut self, id: PeerId, name: Option<&str>) -> Result<(), EngineError> {
        let display = name.unwrap_or(id.as_str()).to_string();
        let identity = Identity::new(id, &display);
        self.sim.add_peer(identity, self.config.clone())?;
        Ok(())
    }

    pub fn advance(&mut self, ms: u64) {
        self.sim.advance(Duration::from_millis(ms));
    }

    fn peer(&self, id: &PeerId) -> Result<&Peer, EngineError> {
        self.sim
            .peer(id)
            .ok_or_else(|| EngineError::Sim(SimError::UnknownPeer(id.clone())))
    }

    /// Runs a board intent on `peer`; `false` from the intent means the
    /// peer does not know the board.
    fn request(
        &mut self,
        peer: &PeerId,
        board: BoardId,
        intent: impl FnOnce(&mut Peer, &mut Outbox) -> bool,
    ) -> Result<(), EngineError> {
        if self.sim.with_peer(peer, intent)? {
            Ok(())
        } else {
            Err(EngineError::UnknownBoard {
                peer: peer.clone(),
                board,
            })
        }
    }

    /// Handles the `isready` command.
    pub fn handle_isready<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "readyok")?;
        out.flush()
    }

    /// Handles `create`: prints the new board's id.
    pub fn handle_create<W: Write>(&mut self, peer: &PeerId, out: &mut W) -> Result<(), EngineError> {
        let position = self.config.default_board;
        let created = self
            .sim
            .with_peer(peer, |p, bus| p.create_board(position, bus))?;
        let id = created.ok_or_else(|| EngineError::NotSource(peer.clone()))?;
        writeln!(out, "board {}", id)?;
        out.flush()?;
        Ok(())
    }

    pub fn remove(&mut self, peer: &PeerId, board: BoardId) -> Result<(), EngineError> {
        self.request(peer, board, |p, _| p.remove_board(board))
    }

    /// Asks for a seat. Without a name the peer's display name is used.
    pub fn register(
        &mut self,
        peer: &PeerId,
        board: BoardId,
        team: Team,
        name: Option<&str>,
    ) -> Result<(), EngineError> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.peer(peer)?.context().identity().display_name.clone(),
        };
        self.request(peer, board, |p, bus| p.register(board, team, &name, bus))
    }

    pub fn unregister(&mut self, peer: &PeerId, board: BoardId, team: Team) -> Result<(), EngineError> {
        self.request(peer, board, |p, bus| p.unregister(board, team, bus))
    }

    pub fn start(&mut self, peer: &PeerId, board: BoardId) -> Result<(), EngineError> {
        self.request(peer, board, |p, bus| p.start(board, bus))
    }

    pub fn restart(&mut self, peer: &PeerId, board: BoardId) -> Result<(), EngineError> {
        self.request(peer, board, |p, bus| p.restart(board, bus))
    }

    pub fn select(&mut self, peer: &PeerId, board: BoardId, tile: Tile) -> Result<(), EngineError> {
        self.request(peer, board, |p, bus| p.select(board, tile, bus))
    }

    pub fn move_to(&mut self, peer: &PeerId, board: BoardId, tile: Tile) -> Result<(), EngineError> {
        self.request(peer, board, |p, bus| p.move_to(board, tile, bus))
    }

    /// A pointer hit. Clicks that map to no request are dropped quietly.
    pub fn click(&mut self, peer: &PeerId, board: BoardId, x: i32, y: i32) -> Result<(), EngineError> {
        let sent = self.sim.with_peer(peer, |p, bus| p.click(board, x, y, bus))?;
        if sent.is_none() {
            debug!(%peer, %board, x, y, "click produced no request");
        }
        Ok(())
    }

    /// Handles `show`: the menu labels, then the grid.
    pub fn handle_show<W: Write>(&self, peer: &PeerId, board: BoardId, out: &mut W) -> Result<(), EngineError> {
        let view = self
            .peer(peer)?
            .board(board)
            .ok_or_else(|| EngineError::UnknownBoard {
                peer: peer.clone(),
                board,
            })?;
        let labels = BoardLabels::for_board(view);
        writeln!(out, "board {} {} [{}]", board, labels.state, labels.start_button)?;
        for team in ALL_TEAMS {
            let i = team.index();
            writeln!(out, "{}: {}, {}", team, labels.registry[i], labels.markers[i])?;
        }
        for line in grid_lines(view) {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Handles `snapshot`: the board's wire snapshot as one JSON line.
    pub fn handle_snapshot<W: Write>(&self, peer: &PeerId, board: BoardId, out: &mut W) -> Result<(), EngineError> {
        let view = self
            .peer(peer)?
            .board(board)
            .ok_or_else(|| EngineError::UnknownBoard {
                peer: peer.clone(),
                board,
            })?;
        let json = serde_json::to_string(&encode_snapshot(view))?;
        writeln!(out, "snapshot {}", json)?;
        out.flush()?;
        Ok(())
    }

    /// Handles `source`: the trusted source as the peer records it.
    pub fn handle_source<W: Write>(&self, peer: &PeerId, out: &mut W) -> Result<(), EngineError> {
        match self.peer(peer)?.context().trusted_source() {
            Some(source) => writeln!(out, "source {}", source)?,
            None => writeln!(out, "source none")?,
        }
        out.flush()?;
        Ok(())
    }
}

//! Request validation performed by the trusted source.
//!
//! Each check answers whether a request may become an accept. A rejection is
//! never sent back to the requester; the peer only logs it.

use crate::board::{Team, Tile};
use crate::config::MovePolicy;
use crate::identity::{sanitize_display_name, PeerId};

use super::machine::Board;
use super::session::{BoardId, Seat, SessionState};

/// Why a request was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("board {0} is unknown")]
    UnknownBoard(BoardId),

    #[error("registration is closed while the game is in session")]
    InSession,

    #[error("the board is idle")]
    Idle,

    #[error("the {0} seat is held by another player")]
    SeatTaken(Team),

    #[error("requester is not seated on this board")]
    NotSeated,

    #[error("both seats must be filled to start")]
    SeatsOpen,

    #[error("it is {0}'s turn")]
    NotTheirTurn(Team),

    #[error("a capture chain is in progress")]
    ChainInProgress,

    #[error("tile {0} is empty")]
    EmptyTile(Tile),

    #[error("tile {0} is occupied")]
    Occupied(Tile),

    #[error("marker on {0} does not belong to the team on turn")]
    WrongTeam(Tile),

    #[error("no marker is selected")]
    NoSelection,

    #[error("tile {0} is not a legal destination")]
    NotACandidate(Tile),
}

/// What an accepted registration request does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Fill(Seat),
    Clear,
}

impl Board {
    /// Checks a registration request for `team`.
    ///
    /// An empty name clears the seat. A request from the player already on
    /// the seat also clears it, so the seat button toggles.
    pub fn validate_registration(
        &self,
        requester: &PeerId,
        display_name: &str,
        team: Team,
    ) -> Result<Registration, Rejection> {
        if self.session() == SessionState::InSession {
            return Err(Rejection::InSession);
        }
        let name = sanitize_display_name(display_name);
        if name.is_empty() {
            return Ok(Registration::Clear);
        }
        match self.seat(team) {
            Some(seat) if &seat.player_id == requester => Ok(Registration::Clear),
            Some(_) => Err(Rejection::SeatTaken(team)),
            None => Ok(Registration::Fill(Seat {
                player_id: requester.clone(),
                display_name: name,
            })),
        }
    }

    /// Checks a start request. In session, a start request ends the game.
    pub fn validate_start(&self, requester: &PeerId) -> Result<(), Rejection> {
        if self.team_of(requester).is_none() {
            return Err(Rejection::NotSeated);
        }
        if self.session() != SessionState::InSession
            && (self.seat(Team::Red).is_none() || self.seat(Team::Blue).is_none())
        {
            return Err(Rejection::SeatsOpen);
        }
        Ok(())
    }

    pub fn validate_restart(&self, requester: &PeerId) -> Result<(), Rejection> {
        if self.team_of(requester).is_none() {
            return Err(Rejection::NotSeated);
        }
        if self.session() == SessionState::Idle {
            return Err(Rejection::Idle);
        }
        Ok(())
    }

    /// Whether `requester` may act on the pieces during play.
    fn check_mover(&self, requester: &PeerId, policy: MovePolicy) -> Result<(), Rejection> {
        match policy {
            MovePolicy::Strict => match self.seat(self.turn()) {
                Some(seat) if &seat.player_id == requester => Ok(()),
                _ => Err(Rejection::NotTheirTurn(self.turn())),
            },
            MovePolicy::Lenient => self.team_of(requester).map(|_| ()).ok_or(Rejection::NotSeated),
        }
    }

    /// Checks a select request for `tile`.
    ///
    /// Outside of play any occupied tile may be selected.
    pub fn validate_select(
        &self,
        requester: &PeerId,
        tile: Tile,
        policy: MovePolicy,
    ) -> Result<(), Rejection> {
        let occupant = self.pieces().occupant(tile).ok_or(Rejection::EmptyTile(tile))?;
        if self.session() != SessionState::InSession {
            return Ok(());
        }
        self.check_mover(requester, policy)?;
        if self.chain().active {
            return Err(Rejection::ChainInProgress);
        }
        if occupant.team != self.turn() {
            return Err(Rejection::WrongTeam(tile));
        }
        Ok(())
    }

    /// Checks a move request of the selected marker to `tile`.
    ///
    /// Outside of play the selected marker may go to any empty tile; in play
    /// `tile` must be one of its candidates.
    pub fn validate_move(
        &self,
        requester: &PeerId,
        tile: Tile,
        policy: MovePolicy,
    ) -> Result<(), Rejection> {
        if self.pieces().selected().is_none() {
            return Err(Rejection::NoSelection);
        }
        if self.session() != SessionState::InSession {
            if self.pieces().is_occupied(tile) {
                return Err(Rejection::Occupied(tile));
            }
            return Ok(());
        }
        self.check_mover(requester, policy)?;
        if self.pieces().candidate_at(tile).is_none() {
            return Err(Rejection::NotACandidate(tile));
        }
        Ok(())
    }
}

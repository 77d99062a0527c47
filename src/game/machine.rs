//! Per-board game state machine.
//!
//! A `Board` holds the session lifecycle, turn, seats and pieces of one
//! checkers board. The `apply_*` methods commit accepted actions and are run
//! identically by every peer; validation of requests lives in `validate`.

use tracing::{debug, info};

use crate::board::{Team, Tile, ALL_TEAMS, MARKERS_PER_TEAM};
use crate::identity::PeerId;
use crate::movegen::{MarkerRecord, MoveEngine, MoveOutcome, Selection};

use super::session::{BoardId, Position, Seat, SessionState};

/// Captures made by the moving team during the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureChain {
    pub active: bool,
    pub captures: u8,
}

/// How a committed move affected the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEffect {
    /// The marker captured and can jump again; the same team keeps the turn.
    ChainContinues,
    /// The turn passed to the given team.
    TurnPassed(Team),
    /// The move took the last opposing marker.
    GameWon(Team),
    /// Pieces rearranged outside of play.
    Arranged,
}

/// A committed move and its effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub outcome: MoveOutcome,
    pub effect: TurnEffect,
}

/// Everything a snapshot carries for one board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub session: SessionState,
    pub turn: Team,
    pub seats: [Option<Seat>; 2],
    pub position: Position,
    pub markers: [[MarkerRecord; MARKERS_PER_TEAM]; 2],
    /// Tile of the selected marker.
    pub selected: Option<Tile>,
    pub chain: CaptureChain,
}

/// One board's game state machine.
#[derive(Debug, Clone)]
pub struct Board {
    id: BoardId,
    session: SessionState,
    turn: Team,
    seats: [Option<Seat>; 2],
    position: Position,
    pieces: MoveEngine,
    chain: CaptureChain,
    winner: Option<Team>,
}

impl Board {
    /// Creates an idle board with pieces in their home layout.
    pub fn new(id: BoardId) -> Self {
        Board {
            id,
            session: SessionState::Idle,
            turn: Team::Red,
            seats: [None, None],
            position: Position::default(),
            pieces: MoveEngine::new(),
            chain: CaptureChain::default(),
            winner: None,
        }
    }

    pub fn id(&self) -> BoardId {
        self.id
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn turn(&self) -> Team {
        self.turn
    }

    pub fn seat(&self, team: Team) -> Option<&Seat> {
        self.seats[team.index()].as_ref()
    }

    /// The team `player` is seated on, Red checked first.
    pub fn team_of(&self, player: &PeerId) -> Option<Team> {
        ALL_TEAMS
            .into_iter()
            .find(|t| self.seat(*t).is_some_and(|s| &s.player_id == player))
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn pieces(&self) -> &MoveEngine {
        &self.pieces
    }

    pub fn chain(&self) -> CaptureChain {
        self.chain
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Markers of `team` still in play.
    pub fn alive_count(&self, team: Team) -> usize {
        self.pieces.alive_count(team)
    }

    /// Moves to `next`, dropping the selection and any capture chain.
    ///
    /// Outside of play every crown is cleared.
    fn change_session(&mut self, next: SessionState) {
        self.pieces.deselect();
        self.chain = CaptureChain::default();
        if next != SessionState::InSession {
            self.pieces.clear_enhancement();
        }
        debug!(board = %self.id, from = ?self.session, to = ?next, "session change");
        self.session = next;
    }

    /// Starts a fresh game: home layout, Red to move.
    fn begin_session(&mut self) {
        self.pieces.reset();
        self.turn = Team::Red;
        self.winner = None;
        self.change_session(SessionState::InSession);
        info!(board = %self.id, "game started");
    }

    /// Registration changes reopen a finished board.
    fn reopen_if_completed(&mut self) {
        if self.session == SessionState::Completed {
            self.winner = None;
            self.change_session(SessionState::Idle);
        }
    }

    /// Seats `seat` on `team`.
    pub fn apply_register(&mut self, team: Team, seat: Seat) {
        debug!(board = %self.id, team = %team, player = %seat.player_id, "seat filled");
        self.seats[team.index()] = Some(seat);
        self.reopen_if_completed();
    }

    /// Empties the seat on `team`.
    pub fn apply_unregister(&mut self, team: Team) {
        debug!(board = %self.id, team = %team, "seat cleared");
        self.seats[team.index()] = None;
        self.reopen_if_completed();
    }

    /// Starts a game, or ends the running one.
    pub fn apply_start(&mut self) {
        if self.session == SessionState::InSession {
            self.winner = None;
            self.change_session(SessionState::Completed);
            info!(board = %self.id, "game ended without a winner");
        } else {
            self.begin_session();
        }
    }

    /// Re-seeds a running or finished game. Returns false on an idle board.
    pub fn apply_restart(&mut self) -> bool {
        match self.session {
            SessionState::InSession | SessionState::Completed => {
                self.begin_session();
                true
            }
            SessionState::Idle => false,
        }
    }

    /// Selects or releases the marker on `tile`.
    pub fn apply_select(&mut self, tile: Tile) -> Selection {
        let jump_only = self.session == SessionState::InSession && self.chain.active;
        self.pieces.select(tile, jump_only)
    }

    /// Moves the selected marker to `tile`.
    ///
    /// In play this captures a jumped opponent, keeps the turn while the
    /// capture chain can continue, passes it otherwise and checks for a win.
    /// Outside of play the marker is simply relocated. Returns `None` when
    /// nothing is selected or, in play, `tile` is not a candidate.
    pub fn apply_move(&mut self, tile: Tile) -> Option<AppliedMove> {
        if self.session != SessionState::InSession {
            let outcome = self.pieces.move_selected(tile, false)?;
            self.chain = CaptureChain::default();
            return Some(AppliedMove {
                outcome,
                effect: TurnEffect::Arranged,
            });
        }

        self.pieces.candidate_at(tile)?;
        let outcome = self.pieces.move_selected(tile, true)?;
        if outcome.captured.is_some() {
            self.chain.active = true;
            self.chain.captures += 1;
        }

        self.pieces.select(outcome.to, false);
        let mut effect = if self.chain.active && self.pieces.refresh_candidates(true) {
            debug!(board = %self.id, marker = %outcome.marker, "capture chain continues");
            TurnEffect::ChainContinues
        } else {
            self.pieces.deselect();
            self.chain = CaptureChain::default();
            self.turn = self.turn.opponent();
            TurnEffect::TurnPassed(self.turn)
        };

        if let Some(loser) = ALL_TEAMS.into_iter().find(|t| self.pieces.alive_count(*t) == 0) {
            let winner = loser.opponent();
            self.winner = Some(winner);
            self.change_session(SessionState::Completed);
            info!(board = %self.id, winner = %winner, "game won");
            effect = TurnEffect::GameWon(winner);
        }

        Some(AppliedMove { outcome, effect })
    }

    /// Captures everything a snapshot needs.
    pub fn state(&self) -> BoardState {
        BoardState {
            session: self.session,
            turn: self.turn,
            seats: self.seats.clone(),
            position: self.position,
            markers: [self.pieces.records(Team::Red), self.pieces.records(Team::Blue)],
            selected: self
                .pieces
                .selected()
                .and_then(|id| self.pieces.marker(id).tile),
            chain: self.chain,
        }
    }

    /// Overwrites this board from a snapshot.
    ///
    /// The selection and a running capture chain come back with it, so the
    /// next accepted move applies the same way here as on the source. A
    /// finished board's winner is the side that still has markers. Returns
    /// the contested tile if two markers claim it; the board is left in its
    /// previous session with pieces reset.
    pub fn load(&mut self, state: BoardState) -> Result<(), Tile> {
        self.pieces.restore(&state.markers)?;
        self.session = state.session;
        self.turn = state.turn;
        self.seats = state.seats;
        self.position = state.position;
        self.chain = match state.session {
            SessionState::InSession => state.chain,
            _ => CaptureChain::default(),
        };
        if let Some(tile) = state.selected {
            self.apply_select(tile);
        }
        self.winner = match state.session {
            SessionState::Completed => ALL_TEAMS
                .into_iter()
                .find(|t| self.pieces.alive_count(*t) == 0)
                .map(Team::opponent),
            _ => None,
        };
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::board::MarkerId;

    pub(crate) fn tile(x: i32, y: i32) -> Tile {
        Tile::new(x, y).unwrap()
    }

    pub(crate) fn seat(id: &str) -> Seat {
        Seat {
            player_id: PeerId::new(id).unwrap(),
            display_name: id.to_uppercase(),
        }
    }

    /// A started board with `alice` on Red and `bob` on Blue.
    pub(crate) fn started_board() -> Board {
        let mut board = Board::new(BoardId(0));
        board.apply_register(Team::Red, seat("alice"));
        board.apply_register(Team::Blue, seat("bob"));
        board.apply_start();
        board
    }

    /// Rebuilds a started board with only the listed markers alive.
    pub(crate) fn arranged(placed: &[(Team, usize, Tile)]) -> Board {
        let mut board = started_board();
        let mut state = board.state();
        for team in ALL_TEAMS {
            for record in state.markers[team.index()].iter_mut() {
                *record = MarkerRecord { tile: None, captured: true, enhanced: false };
            }
        }
        for &(team, slot, t) in placed {
            state.markers[team.index()][slot] = MarkerRecord {
                tile: Some(t),
                captured: false,
                enhanced: false,
            };
        }
        board.load(state).unwrap();
        board
    }

    #[test]
    fn new_board_is_idle_with_full_teams() {
        let board = Board::new(BoardId(3));
        assert_eq!(board.session(), SessionState::Idle);
        assert_eq!(board.turn(), Team::Red);
        assert_eq!(board.alive_count(Team::Red), 12);
        assert_eq!(board.alive_count(Team::Blue), 12);
        assert!(board.seat(Team::Red).is_none());
    }

    #[test]
    fn start_resets_and_gives_red_the_turn() {
        let board = started_board();
        assert_eq!(board.session(), SessionState::InSession);
        assert_eq!(board.turn(), Team::Red);
        assert_eq!(board.team_of(&PeerId::new("bob").unwrap()), Some(Team::Blue));
    }

    #[test]
    fn plain_move_passes_turn() {
        let mut board = started_board();
        board.apply_select(tile(0, 2));
        let applied = board.apply_move(tile(1, 3)).unwrap();
        assert_eq!(applied.effect, TurnEffect::TurnPassed(Team::Blue));
        assert_eq!(board.turn(), Team::Blue);
        assert!(board.pieces().selected().is_none());
    }

    #[test]
    fn move_off_candidates_is_refused_in_play() {
        let mut board = started_board();
        assert!(board.apply_move(tile(1, 3)).is_none());
        board.apply_select(tile(0, 2));
        assert!(board.apply_move(tile(3, 3)).is_none());
        assert_eq!(board.turn(), Team::Red);
        assert!(board.pieces().is_occupied(tile(0, 2)));
    }

    #[test]
    fn capture_without_follow_up_passes_turn() {
        let mut board = arranged(&[
            (Team::Red, 0, tile(2, 2)),
            (Team::Blue, 0, tile(3, 3)),
            (Team::Blue, 1, tile(7, 7)),
        ]);
        board.apply_select(tile(2, 2));
        let applied = board.apply_move(tile(4, 4)).unwrap();
        assert_eq!(applied.outcome.captured, Some(MarkerId::new(Team::Blue, 0).unwrap()));
        assert_eq!(applied.effect, TurnEffect::TurnPassed(Team::Blue));
        assert_eq!(board.alive_count(Team::Blue), 1);
        assert_eq!(board.alive_count(Team::Red), 1);
        assert_eq!(board.chain(), CaptureChain::default());
    }

    #[test]
    fn capture_chain_keeps_turn_and_selection() {
        let mut board = arranged(&[
            (Team::Red, 0, tile(0, 0)),
            (Team::Blue, 0, tile(1, 1)),
            (Team::Blue, 1, tile(3, 3)),
            (Team::Blue, 2, tile(7, 7)),
        ]);
        board.apply_select(tile(0, 0));
        let first = board.apply_move(tile(2, 2)).unwrap();
        assert_eq!(first.effect, TurnEffect::ChainContinues);
        assert_eq!(board.turn(), Team::Red);
        assert_eq!(board.pieces().selected(), Some(MarkerId::new(Team::Red, 0).unwrap()));
        assert!(board.pieces().candidates().iter().all(|c| c.is_jump()));
        assert!(board.chain().active);

        let second = board.apply_move(tile(4, 4)).unwrap();
        assert_eq!(second.effect, TurnEffect::TurnPassed(Team::Blue));
        assert_eq!(board.alive_count(Team::Blue), 1);
    }

    #[test]
    fn last_capture_completes_game() {
        let mut board = arranged(&[(Team::Red, 0, tile(2, 2)), (Team::Blue, 0, tile(3, 3))]);
        board.apply_select(tile(2, 2));
        let applied = board.apply_move(tile(4, 4)).unwrap();
        assert_eq!(applied.effect, TurnEffect::GameWon(Team::Red));
        assert_eq!(board.session(), SessionState::Completed);
        assert_eq!(board.winner(), Some(Team::Red));
    }

    #[test]
    fn start_while_in_session_ends_game() {
        let mut board = started_board();
        board.apply_start();
        assert_eq!(board.session(), SessionState::Completed);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn restart_reseeds_running_or_finished_game() {
        let mut board = started_board();
        board.apply_select(tile(0, 2));
        board.apply_move(tile(1, 3));
        assert!(board.apply_restart());
        assert_eq!(board.turn(), Team::Red);
        assert!(board.pieces().is_occupied(tile(0, 2)));

        board.apply_start();
        assert!(board.apply_restart());
        assert_eq!(board.session(), SessionState::InSession);

        let mut idle = Board::new(BoardId(1));
        assert!(!idle.apply_restart());
        assert_eq!(idle.session(), SessionState::Idle);
    }

    #[test]
    fn registration_change_reopens_finished_board() {
        let mut board = started_board();
        board.apply_start();
        board.apply_unregister(Team::Blue);
        assert_eq!(board.session(), SessionState::Idle);
        assert!(board.seat(Team::Blue).is_none());
    }

    #[test]
    fn arranging_outside_play_relocates_freely() {
        let mut board = Board::new(BoardId(0));
        board.apply_select(tile(0, 2));
        let applied = board.apply_move(tile(5, 4)).unwrap();
        assert_eq!(applied.effect, TurnEffect::Arranged);
        assert_eq!(board.turn(), Team::Red);
        assert!(board.pieces().is_occupied(tile(5, 4)));
    }

    #[test]
    fn leaving_play_clears_crowns() {
        let mut board = arranged(&[(Team::Red, 0, tile(0, 6)), (Team::Blue, 0, tile(6, 6))]);
        board.apply_select(tile(0, 6));
        let applied = board.apply_move(tile(1, 7)).unwrap();
        assert!(applied.outcome.enhanced);
        assert!(board.pieces().marker(applied.outcome.marker).enhanced);
        board.apply_start();
        assert!(!board.pieces().marker(applied.outcome.marker).enhanced);
    }

    #[test]
    fn load_restores_state_and_derives_winner() {
        let source = arranged(&[(Team::Red, 0, tile(2, 2)), (Team::Blue, 0, tile(3, 3))]);
        let mut state = source.state();
        state.session = SessionState::Completed;
        state.markers[1][0] = MarkerRecord { tile: None, captured: true, enhanced: false };

        let mut copy = Board::new(BoardId(0));
        copy.load(state.clone()).unwrap();
        assert_eq!(copy.state(), state);
        assert_eq!(copy.winner(), Some(Team::Red));
    }

    #[test]
    fn load_carries_selection_and_chain() {
        let mut source = arranged(&[
            (Team::Red, 0, tile(0, 0)),
            (Team::Blue, 0, tile(1, 1)),
            (Team::Blue, 1, tile(3, 3)),
            (Team::Blue, 2, tile(7, 7)),
        ]);
        source.apply_select(tile(0, 0));
        source.apply_move(tile(2, 2)).unwrap();

        let mut copy = Board::new(BoardId(0));
        copy.load(source.state()).unwrap();
        assert_eq!(copy.state(), source.state());
        assert_eq!(copy.chain(), CaptureChain { active: true, captures: 1 });
        assert_eq!(copy.pieces().candidates(), source.pieces().candidates());

        let replayed = copy.apply_move(tile(4, 4)).unwrap();
        assert_eq!(replayed, source.apply_move(tile(4, 4)).unwrap());
        assert_eq!(copy.state(), source.state());
    }

    #[test]
    fn chain_is_dropped_when_loaded_outside_play() {
        let mut state = started_board().state();
        state.session = SessionState::Idle;
        state.selected = Some(tile(0, 2));
        state.chain = CaptureChain { active: true, captures: 2 };

        let mut copy = Board::new(BoardId(0));
        copy.load(state).unwrap();
        assert_eq!(copy.chain(), CaptureChain::default());
        assert_eq!(copy.pieces().selected(), copy.pieces().occupant(tile(0, 2)));
    }
}

//! One participant of the scene.
//!
//! A `Peer` owns its copy of every board and reconciles it with the rest of
//! the scene purely through bus messages. Local intents become requests;
//! only the trusted source turns a valid request into an accept; every peer
//! applies accepts from the trusted source, and nothing else, to its boards.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::board::{Team, Tile};
use crate::config::{MovePolicy, PeerConfig};
use crate::game::{Board, BoardId, Position, Registration, Rejection, Seat, SessionState};
use crate::identity::{sanitize_display_name, Identity, PeerId};
use crate::protocol::{encode_snapshot, parse_snapshot, BoardCommand, BoardSnapshot, Envelope, Message};
use crate::registry::BoardRegistry;

use super::bus::MessageBus;
use super::context::SceneContext;
use super::election::{ElectionStep, TrustedSourceElector};

#[derive(Debug)]
pub struct Peer {
    context: SceneContext,
    config: PeerConfig,
    registry: BoardRegistry,
    elector: TrustedSourceElector,
}

impl Peer {
    pub fn new(identity: Identity, config: PeerConfig) -> Self {
        Peer::with_context(SceneContext::new(identity), config)
    }

    /// Builds a peer around a prepared context, e.g. one with a custom
    /// trust policy.
    pub fn with_context(context: SceneContext, config: PeerConfig) -> Self {
        let elector = TrustedSourceElector::new(config.election, config.seed);
        Peer {
            context,
            config,
            registry: BoardRegistry::new(),
            elector,
        }
    }

    pub fn id(&self) -> &PeerId {
        self.context.user_id()
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn registry(&self) -> &BoardRegistry {
        &self.registry
    }

    pub fn board(&self, id: BoardId) -> Option<&Board> {
        self.registry.get(id)
    }

    pub fn elector(&self) -> &TrustedSourceElector {
        &self.elector
    }

    fn send(&self, bus: &mut impl MessageBus, message: Message) {
        bus.emit(Envelope::new(self.id().clone(), message));
    }

    // --- election ---

    /// Enters the scene at `now` and starts looking for the trusted source.
    pub fn join(&mut self, now: Duration) {
        info!(peer = %self.id(), "joined scene");
        self.elector.begin(now);
    }

    /// When this peer next needs `poll`.
    pub fn next_timer(&self) -> Option<Duration> {
        self.elector.next_due()
    }

    /// Runs election steps due at `now`. Returns how many fired.
    pub fn poll(&mut self, now: Duration, bus: &mut impl MessageBus) -> usize {
        let mut fired = 0;
        while let Some(step) = self.elector.poll(now) {
            fired += 1;
            match step {
                ElectionStep::RequestSource { attempt } => {
                    debug!(peer = %self.id(), attempt, "source sync attempt");
                    self.request_source(bus);
                }
                ElectionStep::SelfElect => self.self_elect(bus),
            }
        }
        fired
    }

    /// Asks the scene's trusted source to announce itself.
    pub fn request_source(&self, bus: &mut impl MessageBus) {
        self.send(bus, Message::GetSource);
    }

    fn announce_source(&self, bus: &mut impl MessageBus) {
        self.send(
            bus,
            Message::SyncSource {
                source: self.id().clone(),
            },
        );
    }

    /// Claims the source role after nobody answered.
    fn self_elect(&mut self, bus: &mut impl MessageBus) {
        info!(peer = %self.id(), "becoming the initial trusted source");
        if self.registry.is_empty() {
            self.registry.create(self.config.default_board);
        }
        self.announce_source(bus);
    }

    fn push_snapshot(&self, id: BoardId, bus: &mut impl MessageBus) {
        if let Some(board) = self.registry.get(id) {
            self.send(bus, Message::SyncBoard(encode_snapshot(board)));
        }
    }

    // --- inbound ---

    /// Dispatches one envelope from the bus.
    pub fn handle(&mut self, envelope: &Envelope, bus: &mut impl MessageBus) {
        let sender = &envelope.sender;
        match &envelope.message {
            Message::GetSource => self.on_get_source(sender, bus),
            Message::SyncSource { source } => self.on_sync_source(source, bus),
            Message::SyncBoard(snapshot) => self.on_sync_board(sender, snapshot),
            Message::Board { board, command } if command.is_request() => {
                self.on_request(sender, *board, command, bus)
            }
            Message::Board { board, command } => self.on_accept(sender, *board, command),
        }
    }

    fn on_get_source(&self, sender: &PeerId, bus: &mut impl MessageBus) {
        if self.context.is_source() {
            debug!(peer = %self.id(), %sender, "source requested, announcing");
            self.announce_source(bus);
        }
    }

    fn on_sync_source(&mut self, source: &PeerId, bus: &mut impl MessageBus) {
        self.context.set_trusted_source(source.clone());
        self.elector.cancel();
        if self.context.is_source() {
            debug!(peer = %self.id(), boards = self.registry.len(), "pushing board state");
            for id in self.registry.ids().collect::<Vec<_>>() {
                self.push_snapshot(id, bus);
            }
        }
    }

    /// Loads a pushed board. The source loads its own pushes too, so every
    /// peer applies a push at the same point of the message stream.
    fn on_sync_board(&mut self, sender: &PeerId, snapshot: &BoardSnapshot) {
        if !self.context.is_authoritative(sender) {
            debug!(peer = %self.id(), %sender, board = %snapshot.board, "snapshot from non-source dropped");
            return;
        }
        let state = match parse_snapshot(snapshot) {
            Ok(state) => state,
            Err(e) => {
                warn!(peer = %self.id(), board = %snapshot.board, error = %e, "bad snapshot");
                return;
            }
        };
        let me = self.context.user_id().clone();
        let board = self.registry.get_or_create(snapshot.board);
        if let Err(tile) = board.load(state) {
            warn!(peer = %me, board = %snapshot.board, %tile, "snapshot collision");
            return;
        }
        debug!(peer = %me, board = %snapshot.board, "board synced");

        match board.team_of(&me) {
            Some(team) => self.context.set_seat(snapshot.board, team),
            None => self.context.clear_seat(snapshot.board, None),
        }
    }

    fn policy(&self) -> MovePolicy {
        self.config.move_policy
    }

    /// Turns a valid request into the matching accept.
    fn validate(
        &self,
        sender: &PeerId,
        board: &Board,
        command: &BoardCommand,
    ) -> Result<Option<BoardCommand>, Rejection> {
        let accept = match command {
            BoardCommand::RegisterRequest { display_name, team } => {
                match board.validate_registration(sender, display_name, *team)? {
                    Registration::Fill(seat) => BoardCommand::RegisterAccept {
                        player_id: seat.player_id,
                        display_name: seat.display_name,
                        team: *team,
                    },
                    Registration::Clear => BoardCommand::UnregisterAccept { team: *team },
                }
            }
            BoardCommand::StartRequest => {
                board.validate_start(sender)?;
                BoardCommand::StartAccept
            }
            BoardCommand::RestartRequest => {
                board.validate_restart(sender)?;
                BoardCommand::RestartAccept
            }
            BoardCommand::SelectRequest { tile } => {
                board.validate_select(sender, *tile, self.policy())?;
                BoardCommand::SelectAccept { tile: *tile }
            }
            BoardCommand::MoveRequest { tile } => {
                board.validate_move(sender, *tile, self.policy())?;
                BoardCommand::MoveAccept { tile: *tile }
            }
            _ => return Ok(None),
        };
        Ok(Some(accept))
    }

    fn on_request(
        &self,
        sender: &PeerId,
        id: BoardId,
        command: &BoardCommand,
        bus: &mut impl MessageBus,
    ) {
        if !self.context.is_source() {
            return;
        }
        let result = self
            .registry
            .get(id)
            .ok_or(Rejection::UnknownBoard(id))
            .and_then(|board| self.validate(sender, board, command));
        match result {
            Ok(Some(accept)) => {
                debug!(peer = %self.id(), %sender, board = %id, kind = accept.code(), "request accepted");
                self.send(bus, Message::board(id, accept));
            }
            Ok(None) => {}
            Err(reason) => {
                debug!(peer = %self.id(), %sender, board = %id, kind = command.code(), %reason, "request rejected");
            }
        }
    }

    fn on_accept(&mut self, sender: &PeerId, id: BoardId, command: &BoardCommand) {
        if !self.context.is_authoritative(sender) {
            debug!(peer = %self.id(), %sender, board = %id, kind = command.code(), "accept from non-source dropped");
            return;
        }
        let me = self.context.user_id().clone();
        let Some(board) = self.registry.get_mut(id) else {
            debug!(peer = %me, board = %id, "accept for unknown board");
            return;
        };

        match command {
            BoardCommand::RegisterAccept {
                player_id,
                display_name,
                team,
            } => {
                board.apply_register(
                    *team,
                    Seat {
                        player_id: player_id.clone(),
                        display_name: sanitize_display_name(display_name),
                    },
                );
                if *player_id == me {
                    self.context.set_seat(id, *team);
                } else {
                    self.context.clear_seat(id, Some(*team));
                }
            }
            BoardCommand::UnregisterAccept { team } => {
                board.apply_unregister(*team);
                self.context.clear_seat(id, Some(*team));
            }
            BoardCommand::StartAccept => board.apply_start(),
            BoardCommand::RestartAccept => {
                if !board.apply_restart() {
                    warn!(peer = %me, board = %id, "restart accepted on idle board");
                }
            }
            BoardCommand::SelectAccept { tile } => {
                board.apply_select(*tile);
            }
            BoardCommand::MoveAccept { tile } => {
                if board.apply_move(*tile).is_none() {
                    warn!(peer = %me, board = %id, %tile, "accepted move does not apply");
                }
            }
            _ => {}
        }
    }

    // --- local intents ---

    /// Sends a request for `board`. Unknown boards are ignored.
    fn request(&self, id: BoardId, command: BoardCommand, bus: &mut impl MessageBus) -> bool {
        if self.registry.get(id).is_none() {
            debug!(peer = %self.id(), board = %id, "intent for unknown board");
            return false;
        }
        self.send(bus, Message::board(id, command));
        true
    }

    /// Asks to take (or, if already held, leave) the seat of `team`.
    pub fn register(
        &self,
        board: BoardId,
        team: Team,
        display_name: &str,
        bus: &mut impl MessageBus,
    ) -> bool {
        let command = BoardCommand::RegisterRequest {
            display_name: sanitize_display_name(display_name),
            team,
        };
        self.request(board, command, bus)
    }

    /// Asks to empty the seat of `team`.
    pub fn unregister(&self, board: BoardId, team: Team, bus: &mut impl MessageBus) -> bool {
        self.register(board, team, "", bus)
    }

    /// Asks to start the game, or to end the one in session.
    pub fn start(&self, board: BoardId, bus: &mut impl MessageBus) -> bool {
        self.request(board, BoardCommand::StartRequest, bus)
    }

    pub fn restart(&self, board: BoardId, bus: &mut impl MessageBus) -> bool {
        self.request(board, BoardCommand::RestartRequest, bus)
    }

    pub fn select(&self, board: BoardId, tile: Tile, bus: &mut impl MessageBus) -> bool {
        self.request(board, BoardCommand::SelectRequest { tile }, bus)
    }

    pub fn move_to(&self, board: BoardId, tile: Tile, bus: &mut impl MessageBus) -> bool {
        self.request(board, BoardCommand::MoveRequest { tile }, bus)
    }

    /// Whether the local user may act on `board` during play.
    fn may_act(&self, board: &Board) -> bool {
        match self.policy() {
            MovePolicy::Strict => board
                .seat(board.turn())
                .is_some_and(|s| &s.player_id == self.id()),
            MovePolicy::Lenient => self.context.seat().is_some_and(|(b, _)| b == board.id()),
        }
    }

    /// Turns a pointer hit on `board` into a select or move request.
    ///
    /// The hit is clamped onto the board. Returns the request sent, if any.
    pub fn click(
        &self,
        id: BoardId,
        x: i32,
        y: i32,
        bus: &mut impl MessageBus,
    ) -> Option<BoardCommand> {
        let board = self.registry.get(id)?;
        let tile = Tile::clamped(x, y);
        let pieces = board.pieces();
        let occupant = pieces.occupant(tile);
        let has_selection = pieces.selected().is_some();

        let command = if board.session() != SessionState::InSession {
            match occupant {
                Some(_) => BoardCommand::SelectRequest { tile },
                None if has_selection => BoardCommand::MoveRequest { tile },
                None => return None,
            }
        } else {
            if !self.may_act(board) {
                debug!(peer = %self.id(), board = %id, "click ignored, not this player's move");
                return None;
            }
            match occupant {
                Some(m) if m.team == board.turn() => BoardCommand::SelectRequest { tile },
                Some(_) => return None,
                None if has_selection && pieces.candidate_at(tile).is_some() => {
                    BoardCommand::MoveRequest { tile }
                }
                None => return None,
            }
        };
        self.send(bus, Message::board(id, command.clone()));
        Some(command)
    }

    /// Creates a board and pushes it to the scene. Only the trusted source
    /// may create boards.
    pub fn create_board(&mut self, position: Position, bus: &mut impl MessageBus) -> Option<BoardId> {
        if !self.context.is_source() {
            debug!(peer = %self.id(), "board creation refused, not source");
            return None;
        }
        let id = self.registry.create(position);
        self.push_snapshot(id, bus);
        Some(id)
    }

    /// Drops a board from this peer's registry.
    pub fn remove_board(&mut self, id: BoardId) -> bool {
        self.context.clear_seat(id, None);
        self.registry.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Outbox;

    fn peer(id: &str) -> Peer {
        let config = PeerConfig {
            seed: Some(1),
            ..PeerConfig::default()
        };
        Peer::new(Identity::new(PeerId::new(id).unwrap(), id), config)
    }

    fn pid(id: &str) -> PeerId {
        PeerId::new(id).unwrap()
    }

    fn tile(x: i32, y: i32) -> Tile {
        Tile::new(x, y).unwrap()
    }

    /// Delivers queued envelopes to every peer until the outbox is empty.
    fn settle(peers: &mut [&mut Peer], outbox: &mut Outbox) {
        while let Some(env) = outbox.pop() {
            for p in peers.iter_mut() {
                p.handle(&env, outbox);
            }
        }
    }

    /// A peer that has elected itself and owns board 0.
    fn lone_source(id: &str) -> (Peer, Outbox) {
        let mut source = peer(id);
        let mut outbox = Outbox::new();
        source.join(Duration::ZERO);
        source.poll(Duration::from_secs(30), &mut outbox);
        settle(&mut [&mut source], &mut outbox);
        (source, outbox)
    }

    #[test]
    fn lone_peer_self_elects_with_default_board() {
        let mut alice = peer("alice");
        let mut outbox = Outbox::new();
        alice.join(Duration::ZERO);

        assert_eq!(alice.poll(Duration::from_secs(4), &mut outbox), 0);
        assert_eq!(alice.poll(Duration::from_secs(30), &mut outbox), 4);
        let sent: Vec<Message> = outbox.drain().into_iter().map(|e| e.message).collect();
        assert_eq!(sent[..3], [Message::GetSource, Message::GetSource, Message::GetSource]);
        assert_eq!(sent[3], Message::SyncSource { source: pid("alice") });
        assert_eq!(
            alice.board(BoardId(0)).unwrap().position(),
            Position::new(4.0, 1.0, 8.0)
        );
    }

    #[test]
    fn source_pushes_boards_on_own_announcement() {
        let mut alice = peer("alice");
        let mut outbox = Outbox::new();
        alice.join(Duration::ZERO);
        alice.poll(Duration::from_secs(30), &mut outbox);
        let announce = outbox.drain().pop().unwrap();

        alice.handle(&announce, &mut outbox);
        assert!(alice.context().is_source());
        assert!(!alice.elector().is_running());
        let pushed = outbox.drain();
        assert_eq!(pushed.len(), 1);
        assert!(matches!(&pushed[0].message, Message::SyncBoard(s) if s.board == BoardId(0)));
    }

    #[test]
    fn sync_source_cancels_pending_election() {
        let mut bob = peer("bob");
        let mut outbox = Outbox::new();
        bob.join(Duration::ZERO);
        let announce = Envelope::new(pid("alice"), Message::SyncSource { source: pid("alice") });
        bob.handle(&announce, &mut outbox);
        assert_eq!(bob.context().trusted_source(), Some(&pid("alice")));
        assert_eq!(bob.poll(Duration::from_secs(60), &mut outbox), 0);
        assert!(outbox.is_empty());
    }

    #[test]
    fn only_source_answers_get_source() {
        let (mut alice, mut outbox) = lone_source("alice");
        let mut bob = peer("bob");
        let ask = Envelope::new(pid("carol"), Message::GetSource);

        bob.handle(&ask, &mut outbox);
        assert!(outbox.is_empty());

        alice.handle(&ask, &mut outbox);
        assert_eq!(
            outbox.drain()[0].message,
            Message::SyncSource { source: pid("alice") }
        );
    }

    #[test]
    fn non_source_ignores_requests() {
        let mut bob = peer("bob");
        let mut outbox = Outbox::new();
        let start = Envelope::new(pid("carol"), Message::board(BoardId(0), BoardCommand::StartRequest));
        bob.handle(&start, &mut outbox);
        assert!(outbox.is_empty());
    }

    #[test]
    fn source_accepts_registration_and_applies_on_echo() {
        let (mut alice, mut outbox) = lone_source("alice");
        assert!(alice.register(BoardId(0), Team::Red, "Alice_L", &mut outbox));
        settle(&mut [&mut alice], &mut outbox);

        let board = alice.board(BoardId(0)).unwrap();
        assert_eq!(board.seat(Team::Red).unwrap().display_name, "Alice L");
        assert_eq!(alice.context().seat(), Some((BoardId(0), Team::Red)));

        assert!(alice.unregister(BoardId(0), Team::Red, &mut outbox));
        settle(&mut [&mut alice], &mut outbox);
        assert!(alice.board(BoardId(0)).unwrap().seat(Team::Red).is_none());
        assert_eq!(alice.context().seat(), None);
    }

    #[test]
    fn rejected_request_emits_nothing() {
        let (mut alice, mut outbox) = lone_source("alice");
        alice.start(BoardId(0), &mut outbox);
        let request = outbox.pop().unwrap();
        alice.handle(&request, &mut outbox);
        assert!(outbox.is_empty());
        assert_eq!(alice.board(BoardId(0)).unwrap().session(), SessionState::Idle);
    }

    #[test]
    fn accept_from_non_source_is_ignored() {
        let (mut alice, mut outbox) = lone_source("alice");
        let rogue = Envelope::new(
            pid("mallory"),
            Message::board(BoardId(0), BoardCommand::RegisterAccept {
                player_id: pid("mallory"),
                display_name: "Mal".to_string(),
                team: Team::Red,
            }),
        );
        alice.handle(&rogue, &mut outbox);
        assert!(alice.board(BoardId(0)).unwrap().seat(Team::Red).is_none());
    }

    #[test]
    fn snapshot_creates_unknown_board_and_seat() {
        let mut bob = peer("bob");
        let mut outbox = Outbox::new();
        bob.handle(
            &Envelope::new(pid("alice"), Message::SyncSource { source: pid("alice") }),
            &mut outbox,
        );

        let mut board = Board::new(BoardId(4));
        board.apply_register(
            Team::Blue,
            Seat {
                player_id: pid("bob"),
                display_name: "Bob".to_string(),
            },
        );
        let snapshot = encode_snapshot(&board);

        bob.handle(&Envelope::new(pid("mallory"), Message::SyncBoard(snapshot.clone())), &mut outbox);
        assert!(bob.board(BoardId(4)).is_none());

        bob.handle(&Envelope::new(pid("alice"), Message::SyncBoard(snapshot)), &mut outbox);
        assert_eq!(bob.board(BoardId(4)).unwrap().state(), board.state());
        assert_eq!(bob.context().seat(), Some((BoardId(4), Team::Blue)));
    }

    #[test]
    fn only_source_creates_boards() {
        let (mut alice, mut outbox) = lone_source("alice");
        let mut bob = peer("bob");
        assert_eq!(bob.create_board(Position::default(), &mut outbox), None);

        let id = alice.create_board(Position::new(0.0, 0.0, 2.0), &mut outbox);
        assert_eq!(id, Some(BoardId(1)));
        let pushed = outbox.drain();
        assert!(matches!(&pushed[0].message, Message::SyncBoard(s) if s.board == BoardId(1)));

        assert!(alice.remove_board(BoardId(1)));
        assert!(!alice.remove_board(BoardId(1)));
    }

    #[test]
    fn click_outside_play_selects_then_moves() {
        let (mut alice, mut outbox) = lone_source("alice");
        assert_eq!(alice.click(BoardId(0), 3, 3, &mut outbox), None);
        assert_eq!(
            alice.click(BoardId(0), 0, 2, &mut outbox),
            Some(BoardCommand::SelectRequest { tile: tile(0, 2) })
        );
        settle(&mut [&mut alice], &mut outbox);
        assert_eq!(
            alice.click(BoardId(0), 9, 4, &mut outbox),
            Some(BoardCommand::MoveRequest { tile: tile(7, 4) })
        );
        settle(&mut [&mut alice], &mut outbox);
        assert!(alice.board(BoardId(0)).unwrap().pieces().is_occupied(tile(7, 4)));
    }

    #[test]
    fn click_in_play_respects_turn() {
        let (mut alice, mut outbox) = lone_source("alice");
        alice.register(BoardId(0), Team::Red, "Alice", &mut outbox);
        settle(&mut [&mut alice], &mut outbox);

        let mut bob = peer("bob");
        let announce = Envelope::new(pid("alice"), Message::SyncSource { source: pid("alice") });
        alice.handle(&announce, &mut outbox);
        bob.handle(&announce, &mut outbox);
        settle(&mut [&mut alice, &mut bob], &mut outbox);
        assert!(bob.register(BoardId(0), Team::Blue, "Bob", &mut outbox));
        settle(&mut [&mut alice, &mut bob], &mut outbox);
        alice.start(BoardId(0), &mut outbox);
        settle(&mut [&mut alice, &mut bob], &mut outbox);
        assert_eq!(bob.board(BoardId(0)).unwrap().session(), SessionState::InSession);

        assert_eq!(bob.click(BoardId(0), 1, 5, &mut outbox), None);
        assert_eq!(alice.click(BoardId(0), 1, 5, &mut outbox), None);
        assert_eq!(
            alice.click(BoardId(0), 0, 2, &mut outbox),
            Some(BoardCommand::SelectRequest { tile: tile(0, 2) })
        );
        settle(&mut [&mut alice, &mut bob], &mut outbox);
        assert_eq!(alice.click(BoardId(0), 3, 3, &mut outbox), None);
        assert_eq!(
            alice.click(BoardId(0), 1, 3, &mut outbox),
            Some(BoardCommand::MoveRequest { tile: tile(1, 3) })
        );
        settle(&mut [&mut alice, &mut bob], &mut outbox);
        assert_eq!(bob.board(BoardId(0)).unwrap().turn(), Team::Blue);
        assert_eq!(
            bob.board(BoardId(0)).unwrap().state(),
            alice.board(BoardId(0)).unwrap().state()
        );
    }
}

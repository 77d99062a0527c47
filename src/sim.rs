//! Deterministic in-process scene.
//!
//! Runs several peers against one broadcast bus on a virtual clock. Every
//! envelope goes through its JSON wire form and reaches every peer, the
//! sender included, in emit order. Election timers fire in time order, ties
//! broken by join order, and the bus is drained after each firing.

use std::time::Duration;

use tracing::{trace, warn};

use crate::config::PeerConfig;
use crate::identity::{Identity, PeerId};
use crate::net::{MessageBus, Outbox, Peer};
use crate::protocol::Envelope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("peer '{0}' already joined")]
    DuplicatePeer(PeerId),

    #[error("no peer '{0}' in the scene")]
    UnknownPeer(PeerId),
}

#[derive(Debug, Default)]
pub struct Simulation {
    now: Duration,
    peers: Vec<Peer>,
    outbox: Outbox,
    paused: bool,
    delivered: u64,
}

impl Simulation {
    pub fn new() -> Self {
        Simulation::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Envelopes delivered so far, counting each once.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn peer(&self, id: &PeerId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id() == id)
    }

    /// Joins a peer at the current time and starts its election.
    ///
    /// A configured seed is offset by join order so peers draw different
    /// jitter.
    pub fn add_peer(&mut self, identity: Identity, mut config: PeerConfig) -> Result<(), SimError> {
        if self.peer(&identity.user_id).is_some() {
            return Err(SimError::DuplicatePeer(identity.user_id));
        }
        let index = self.peers.len() as u64;
        config.seed = config.seed.map(|s| s.wrapping_add(index));
        let mut peer = Peer::new(identity, config);
        peer.join(self.now);
        self.peers.push(peer);
        Ok(())
    }

    /// Runs `intent` on one peer, then delivers what it emitted.
    pub fn with_peer<R>(
        &mut self,
        id: &PeerId,
        intent: impl FnOnce(&mut Peer, &mut Outbox) -> R,
    ) -> Result<R, SimError> {
        let peer = self
            .peers
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| SimError::UnknownPeer(id.clone()))?;
        let result = intent(peer, &mut self.outbox);
        self.deliver();
        Ok(result)
    }

    /// Queues an envelope as if some peer had emitted it.
    pub fn inject(&mut self, envelope: Envelope) {
        self.outbox.emit(envelope);
        self.deliver();
    }

    /// Holds emitted envelopes on the bus until `resume_delivery`.
    pub fn pause_delivery(&mut self) {
        self.paused = true;
    }

    pub fn resume_delivery(&mut self) {
        self.paused = false;
        self.deliver();
    }

    /// Drains the bus, handing every envelope to every peer. Returns how many
    /// envelopes went out.
    pub fn deliver(&mut self) -> usize {
        if self.paused {
            return 0;
        }
        let mut count = 0;
        while let Some(envelope) = self.outbox.pop() {
            let wire = match envelope.encode() {
                Ok(wire) => wire,
                Err(e) => {
                    warn!(error = %e, "envelope failed to encode");
                    continue;
                }
            };
            let received = match Envelope::decode(&wire) {
                Ok(env) => env,
                Err(e) => {
                    warn!(error = %e, "envelope dropped at the wire");
                    continue;
                }
            };
            trace!(topic = %received.topic(), sender = %received.sender, "deliver");
            for peer in self.peers.iter_mut() {
                peer.handle(&received, &mut self.outbox);
            }
            count += 1;
        }
        self.delivered += count as u64;
        count
    }

    /// The earliest pending timer at or before `limit`, with its peer index.
    fn next_due(&self, limit: Duration) -> Option<(Duration, usize)> {
        self.peers
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.next_timer().map(|due| (due, i)))
            .filter(|(due, _)| *due <= limit)
            .min()
    }

    /// Moves the clock forward by `by`, firing timers on the way.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        self.deliver();
        while let Some((due, index)) = self.next_due(target) {
            self.now = self.now.max(due);
            self.peers[index].poll(self.now, &mut self.outbox);
            self.deliver();
        }
        self.now = target;
    }

    /// Whether every peer records the same, present, trusted source.
    pub fn converged_source(&self) -> Option<&PeerId> {
        let first = self.peers.first()?.context().trusted_source()?;
        self.peers
            .iter()
            .all(|p| p.context().trusted_source() == Some(first))
            .then_some(first)
    }
}

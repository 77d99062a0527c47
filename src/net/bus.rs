//! The scene message bus seen from one peer.

use std::collections::VecDeque;

use tracing::trace;

use crate::protocol::Envelope;

/// Broadcast channel a peer emits onto.
///
/// Delivery is the bus's concern: every emitted envelope reaches every peer
/// in the scene, the sender included, in emit order per sender.
pub trait MessageBus {
    fn emit(&mut self, envelope: Envelope);
}

/// Collects emitted envelopes until the owner drains them.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: VecDeque<Envelope>,
}

impl Outbox {
    pub fn new() -> Self {
        Outbox::default()
    }

    /// Takes everything emitted so far, oldest first.
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.queued.drain(..).collect()
    }

    pub fn pop(&mut self) -> Option<Envelope> {
        self.queued.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

impl MessageBus for Outbox {
    fn emit(&mut self, envelope: Envelope) {
        trace!(sender = %envelope.sender, topic = %envelope.topic(), "emit");
        self.queued.push_back(envelope);
    }
}

//! Per-peer scene context.
//!
//! Holds what every component of a peer needs to know about the scene: who
//! the local user is, who the trusted source is and where the local user is
//! seated. Components receive it by reference instead of reaching for
//! process-wide state.

use std::fmt;

use tracing::info;

use crate::board::Team;
use crate::game::BoardId;
use crate::identity::{Identity, PeerId};

/// Decides whether a sender speaks for the scene.
pub trait TrustPolicy: fmt::Debug + Send {
    fn is_authoritative(&self, sender: &PeerId, trusted_source: Option<&PeerId>) -> bool;
}

/// Trusts exactly the recorded source id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdEquality;

impl TrustPolicy for IdEquality {
    fn is_authoritative(&self, sender: &PeerId, trusted_source: Option<&PeerId>) -> bool {
        trusted_source == Some(sender)
    }
}

#[derive(Debug)]
pub struct SceneContext {
    identity: Identity,
    trusted_source: Option<PeerId>,
    seat: Option<(BoardId, Team)>,
    policy: Box<dyn TrustPolicy>,
}

impl SceneContext {
    pub fn new(identity: Identity) -> Self {
        SceneContext::with_policy(identity, Box::new(IdEquality))
    }

    pub fn with_policy(identity: Identity, policy: Box<dyn TrustPolicy>) -> Self {
        SceneContext {
            identity,
            trusted_source: None,
            seat: None,
            policy,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> &PeerId {
        &self.identity.user_id
    }

    pub fn trusted_source(&self) -> Option<&PeerId> {
        self.trusted_source.as_ref()
    }

    /// Records `source` as the trusted source. Last writer wins.
    pub fn set_trusted_source(&mut self, source: PeerId) {
        if self.trusted_source.as_ref() != Some(&source) {
            info!(peer = %self.identity.user_id, source = %source, "trusted source recorded");
        }
        self.trusted_source = Some(source);
    }

    /// Whether the local peer is the trusted source.
    pub fn is_source(&self) -> bool {
        self.trusted_source.as_ref() == Some(&self.identity.user_id)
    }

    pub fn is_authoritative(&self, sender: &PeerId) -> bool {
        self.policy.is_authoritative(sender, self.trusted_source.as_ref())
    }

    /// Board and team the local user was last seated on.
    pub fn seat(&self) -> Option<(BoardId, Team)> {
        self.seat
    }

    pub fn set_seat(&mut self, board: BoardId, team: Team) {
        self.seat = Some((board, team));
    }

    /// Forgets the local seat if it is on `board` (and `team`, when given).
    pub fn clear_seat(&mut self, board: BoardId, team: Option<Team>) {
        if let Some((b, t)) = self.seat {
            if b == board && team.map_or(true, |team| team == t) {
                self.seat = None;
            }
        }
    }
}

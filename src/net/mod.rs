//! Peer-to-peer plumbing: the bus seam, the scene context, the trusted-source
//! election and the peer that ties them to its boards.

pub mod bus;
pub mod context;
pub mod election;
pub mod peer;

pub use bus::{MessageBus, Outbox};
pub use context::{IdEquality, SceneContext, TrustPolicy};
pub use election::{ElectionStep, ElectionTask, TrustedSourceElector};
pub use peer::Peer;

//! Peer identity.
//!
//! A `PeerId` names one participant process in the scene. Ids travel inside
//! `_`-delimited snapshot fields, so they are validated on construction and
//! on deserialization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when building a `PeerId`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerIdError {
    #[error("peer id is empty")]
    Empty,

    #[error("peer id '{0}' contains a reserved character")]
    ReservedChar(String),
}

/// Identifier of a peer, unique within a scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerId(String);

impl PeerId {
    /// Validates and wraps a raw id.
    pub fn new(raw: impl Into<String>) -> Result<Self, PeerIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PeerIdError::Empty);
        }
        if raw.chars().any(|c| c == '_' || c == ':' || c.is_whitespace()) {
            return Err(PeerIdError::ReservedChar(raw));
        }
        Ok(PeerId(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PeerId {
    type Error = PeerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PeerId::new(value)
    }
}

impl From<PeerId> for String {
    fn from(id: PeerId) -> Self {
        id.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the identity provider hands us once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: PeerId,
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: PeerId, display_name: &str) -> Self {
        Identity {
            user_id,
            display_name: sanitize_display_name(display_name),
        }
    }
}

/// Makes a display name safe for snapshot fields.
///
/// `_` separates snapshot fields, so it becomes a space; surrounding
/// whitespace is trimmed.
pub fn sanitize_display_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '_' || c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

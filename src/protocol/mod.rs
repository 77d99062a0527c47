//! Wire and console protocols.
//!
//! This module implements the typed bus messages exchanged between peers,
//! the textual board snapshot they carry, and the command parser for the
//! console driver's main loop.

pub mod message;
pub mod parser;
pub mod snapshot;

pub use message::{BoardCommand, Envelope, Message, Topic, WireError};
pub use parser::{parse_command, Command};
pub use snapshot::{encode_snapshot, parse_snapshot, BoardSnapshot, SnapshotError};

//! meshcheckers library.
//!
//! Exposes the board and move engine, the per-board game state machine,
//! the wire protocol, the peer networking layer and the deterministic scene
//! used by the console binary and the integration tests.

pub mod board;
pub mod config;
pub mod engine;
pub mod game;
pub mod identity;
pub mod movegen;
pub mod net;
pub mod protocol;
pub mod registry;
pub mod sim;

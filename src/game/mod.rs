//! Game state machine for a single board.
//!
//! Covers the session lifecycle, seats, turn order, win detection and the
//! validation the trusted source applies before accepting a request.

pub mod labels;
pub mod machine;
pub mod session;
pub mod validate;

pub use labels::{grid_lines, BoardLabels};
pub use machine::{AppliedMove, Board, BoardState, CaptureChain, TurnEffect};
pub use session::{BoardId, Position, Seat, SessionState};
pub use validate::{Registration, Rejection};

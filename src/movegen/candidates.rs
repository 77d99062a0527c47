//! Action candidate generation.
//!
//! Enumerates the legal destinations, plain steps and single jumps, for one
//! marker given the current occupancy.

use crate::board::{MarkerId, Team, Tile};

use super::MoveEngine;

/// Most candidates a marker can have: one per diagonal.
pub const MAX_CANDIDATES: usize = 4;

/// A computed legal destination for the selected marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionCandidate {
    pub target: Tile,
    /// Opponent tile captured when moving to `target`.
    pub jump_over: Option<Tile>,
}

impl ActionCandidate {
    pub fn is_jump(&self) -> bool {
        self.jump_over.is_some()
    }
}

/// Diagonal directions in evaluation order. The first two step toward
/// increasing rows (Red's forward), the last two toward decreasing rows.
const DIRECTIONS: [(i32, i32); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// Returns the directions a marker may travel in.
fn directions_for(team: Team, enhanced: bool) -> impl Iterator<Item = (i32, i32)> {
    DIRECTIONS
        .into_iter()
        .filter(move |&(_, dy)| enhanced || dy == team.forward())
}

/// Generates the candidates for the marker `id`.
///
/// Returns an empty vec for a captured marker. With `jump_only` set, plain
/// steps are suppressed, as during a capture chain.
pub fn action_candidates(engine: &MoveEngine, id: MarkerId, jump_only: bool) -> Vec<ActionCandidate> {
    let marker = engine.marker(id);
    let from = match marker.tile {
        Some(t) if marker.is_alive() => t,
        _ => return Vec::new(),
    };

    let mut out = Vec::with_capacity(MAX_CANDIDATES);
    for (dx, dy) in directions_for(id.team, marker.enhanced) {
        let Some(near) = from.offset(dx, dy) else {
            continue;
        };
        match engine.occupant(near) {
            None => {
                if !jump_only {
                    out.push(ActionCandidate { target: near, jump_over: None });
                }
            }
            Some(other) if other.team != id.team => {
                if let Some(landing) = near.offset(dx, dy) {
                    if engine.occupant(landing).is_none() {
                        out.push(ActionCandidate {
                            target: landing,
                            jump_over: Some(near),
                        });
                    }
                }
            }
            Some(_) => {}
        }
    }
    out
}

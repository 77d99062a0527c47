//! Marker movement and capture.
//!
//! `MoveEngine` owns a board's 24 markers, the tile occupancy index, the
//! current selection and its action candidates. It knows nothing about
//! sessions or turns; the game state machine decides when each operation is
//! allowed.

pub mod candidates;

use tracing::trace;

use crate::board::{Marker, MarkerId, Team, Tile, ALL_TEAMS, BOARD_SIZE, MARKERS_PER_TEAM};

pub use candidates::{action_candidates, ActionCandidate, MAX_CANDIDATES};

const TILE_COUNT: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;

/// Flags of one marker as carried by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRecord {
    pub tile: Option<Tile>,
    pub captured: bool,
    pub enhanced: bool,
}

/// Result of a selection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The marker on the tile is now selected.
    Selected(MarkerId),
    /// The tile held the already-selected marker, which is now released.
    Deselected(MarkerId),
    /// Nothing on the tile; the selection is unchanged.
    Empty,
}

/// What a completed move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub marker: MarkerId,
    pub from: Tile,
    pub to: Tile,
    pub captured: Option<MarkerId>,
    /// True when this move crowned the marker.
    pub enhanced: bool,
}

/// Pieces, occupancy and selection for one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEngine {
    markers: [[Marker; MARKERS_PER_TEAM]; 2],
    /// Occupant of each tile, indexed by `Tile::index`.
    occupancy: [Option<MarkerId>; TILE_COUNT],
    selected: Option<MarkerId>,
    candidates: Vec<ActionCandidate>,
}

impl MoveEngine {
    /// Creates an engine with both teams in their home layout.
    pub fn new() -> Self {
        let markers = ALL_TEAMS.map(|team| {
            std::array::from_fn(|slot| Marker::new(MarkerId { team, slot: slot as u8 }))
        });
        let mut engine = MoveEngine {
            markers,
            occupancy: [None; TILE_COUNT],
            selected: None,
            candidates: Vec::with_capacity(MAX_CANDIDATES),
        };
        engine.reset();
        engine
    }

    /// Puts every marker back on its home tile with all flags cleared.
    pub fn reset(&mut self) {
        self.deselect();
        self.occupancy = [None; TILE_COUNT];
        for team in ALL_TEAMS {
            let homes = team.home_tiles();
            for (marker, home) in self.markers[team.index()].iter_mut().zip(homes) {
                marker.tile = Some(home);
                marker.captured = false;
                marker.enhanced = false;
                self.occupancy[home.index()] = Some(marker.id);
            }
        }
    }

    pub fn marker(&self, id: MarkerId) -> &Marker {
        &self.markers[id.team.index()][id.slot as usize]
    }

    fn marker_mut(&mut self, id: MarkerId) -> &mut Marker {
        &mut self.markers[id.team.index()][id.slot as usize]
    }

    /// All markers of one team in slot order.
    pub fn markers(&self, team: Team) -> &[Marker; MARKERS_PER_TEAM] {
        &self.markers[team.index()]
    }

    /// Every marker, Red slots first.
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().flatten()
    }

    pub fn occupant(&self, tile: Tile) -> Option<MarkerId> {
        self.occupancy[tile.index()]
    }

    pub fn is_occupied(&self, tile: Tile) -> bool {
        self.occupant(tile).is_some()
    }

    /// Markers of `team` still in play.
    pub fn alive_count(&self, team: Team) -> usize {
        self.markers(team).iter().filter(|m| m.is_alive()).count()
    }

    pub fn selected(&self) -> Option<MarkerId> {
        self.selected
    }

    pub fn candidates(&self) -> &[ActionCandidate] {
        &self.candidates
    }

    pub fn candidate_at(&self, tile: Tile) -> Option<ActionCandidate> {
        self.candidates.iter().copied().find(|c| c.target == tile)
    }

    /// Selects the marker on `tile`, or releases it if it is already selected.
    pub fn select(&mut self, tile: Tile, jump_only: bool) -> Selection {
        let Some(id) = self.occupant(tile) else {
            return Selection::Empty;
        };
        if self.selected == Some(id) {
            self.deselect();
            trace!(marker = %id, "deselected");
            return Selection::Deselected(id);
        }
        self.selected = Some(id);
        self.refresh_candidates(jump_only);
        trace!(marker = %id, candidates = self.candidates.len(), "selected");
        Selection::Selected(id)
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.candidates.clear();
    }

    /// Recomputes candidates for the selected marker. Returns whether any exist.
    pub fn refresh_candidates(&mut self, jump_only: bool) -> bool {
        self.candidates = match self.selected {
            Some(id) => action_candidates(self, id, jump_only),
            None => Vec::new(),
        };
        !self.candidates.is_empty()
    }

    /// Moves the selected marker to `to` and releases the selection.
    ///
    /// When `to` is a jump candidate and `allow_capture` is set, the jumped
    /// opponent is captured. Returns `None` if nothing is selected or `to`
    /// is occupied.
    pub fn move_selected(&mut self, to: Tile, allow_capture: bool) -> Option<MoveOutcome> {
        let id = self.selected?;
        let from = self.marker(id).tile?;
        if self.is_occupied(to) {
            return None;
        }

        let mut captured = None;
        if allow_capture {
            if let Some(over) = self.candidate_at(to).and_then(|c| c.jump_over) {
                if let Some(victim) = self.occupant(over).filter(|v| v.team != id.team) {
                    self.capture(victim);
                    captured = Some(victim);
                }
            }
        }

        self.relocate(id, to);
        let enhanced = to.y() == id.team.far_row() && !self.marker(id).enhanced;
        if enhanced {
            self.marker_mut(id).enhanced = true;
        }
        self.deselect();

        Some(MoveOutcome {
            marker: id,
            from,
            to,
            captured,
            enhanced,
        })
    }

    /// Moves `id` onto `to`, keeping the occupancy index in step.
    fn relocate(&mut self, id: MarkerId, to: Tile) {
        if let Some(old) = self.marker(id).tile {
            self.occupancy[old.index()] = None;
        }
        self.marker_mut(id).tile = Some(to);
        self.occupancy[to.index()] = Some(id);
    }

    /// Takes a marker off the board.
    pub fn capture(&mut self, id: MarkerId) {
        if let Some(tile) = self.marker(id).tile {
            if self.occupancy[tile.index()] == Some(id) {
                self.occupancy[tile.index()] = None;
            }
        }
        if self.selected == Some(id) {
            self.deselect();
        }
        let marker = self.marker_mut(id);
        marker.tile = None;
        marker.captured = true;
    }

    /// Puts a marker back in play on `tile`. Returns false if the tile is taken
    /// by a different marker.
    pub fn revive(&mut self, id: MarkerId, tile: Tile) -> bool {
        match self.occupant(tile) {
            Some(other) if other != id => return false,
            _ => {}
        }
        self.relocate(id, tile);
        self.marker_mut(id).captured = false;
        true
    }

    pub fn set_enhanced(&mut self, id: MarkerId, enhanced: bool) {
        self.marker_mut(id).enhanced = enhanced;
    }

    /// Clears the crown on every marker.
    pub fn clear_enhancement(&mut self) {
        for marker in self.markers.iter_mut().flatten() {
            marker.enhanced = false;
        }
    }

    /// Replaces every marker's state from snapshot records, in slot order.
    ///
    /// On a tile collision the engine is left reset and the contested tile is
    /// returned.
    pub fn restore(&mut self, records: &[[MarkerRecord; MARKERS_PER_TEAM]; 2]) -> Result<(), Tile> {
        self.deselect();
        self.occupancy = [None; TILE_COUNT];
        for team in ALL_TEAMS {
            for (slot, record) in records[team.index()].iter().enumerate() {
                let id = MarkerId { team, slot: slot as u8 };
                let marker = self.marker_mut(id);
                marker.enhanced = record.enhanced;
                marker.captured = record.captured;
                marker.tile = None;
                if record.captured {
                    continue;
                }
                if let Some(tile) = record.tile {
                    if self.occupancy[tile.index()].is_some() {
                        self.reset();
                        return Err(tile);
                    }
                    self.marker_mut(id).tile = Some(tile);
                    self.occupancy[tile.index()] = Some(id);
                }
            }
        }
        Ok(())
    }

    /// Snapshot records for one team, in slot order.
    pub fn records(&self, team: Team) -> [MarkerRecord; MARKERS_PER_TEAM] {
        self.markers(team).map(|m| MarkerRecord {
            tile: m.tile,
            captured: m.captured,
            enhanced: m.enhanced,
        })
    }
}

impl Default for MoveEngine {
    fn default() -> Self {
        Self::new()
    }
}

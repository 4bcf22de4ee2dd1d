use core::time::Duration;
use ndarray::Array2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::*;

/// Complete, self-consistent picture of a match at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub grid: Array2<CellRecord>,
    pub state: MatchState,
    pub elapsed: Duration,
    pub mine_count: CellCount,
}

impl GameSnapshot {
    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.grid.dim();
        (
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn cell_at(&self, coords: Coord2) -> CellRecord {
        self.grid[coords.to_nd_index()]
    }

    pub fn revealed_count(&self) -> usize {
        self.grid.iter().filter(|cell| cell.revealed).count()
    }

    pub fn flagged_count(&self) -> usize {
        self.grid.iter().filter(|cell| cell.flagged).count()
    }

    /// Mine counter as shown to the player, negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.mine_count as isize) - (self.flagged_count() as isize)
    }
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Arc<GameSnapshot>>,
    version: u64,
}

/// Single-slot, last-write-wins hand-off between the coordinator and a presentation.
///
/// Intermediate snapshots published between two polls are dropped; consumers compare the returned version
/// against the last one they drew and skip work when it has not increased.
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    slot: Mutex<Slot>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot wholesale and bumps the version.
    pub fn publish(&self, snapshot: GameSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let mut slot = self.slot.lock();
        slot.latest = Some(snapshot);
        slot.version += 1;
        slot.version
    }

    /// Latest snapshot and its version; `None` until the first publish.
    pub fn poll(&self) -> (Option<Arc<GameSnapshot>>, u64) {
        let slot = self.slot.lock();
        (slot.latest.clone(), slot.version)
    }

    pub fn version(&self) -> u64 {
        self.slot.lock().version
    }
}

use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Authoritative grid of one board generation, written only from actor reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    grid: Array2<CellRecord>,
    mine_count: CellCount,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    triggered_mine: Option<Coord2>,
}

impl Board {
    pub fn new(layout: &MineLayout) -> Self {
        let grid = Array2::from_shape_fn(layout.size().to_nd_index(), |(row, col)| {
            let coords = (row as Coord, col as Coord);
            CellRecord::new(
                coords,
                layout.contains_mine(coords),
                layout.adjacent_mine_count(coords),
            )
        });
        Self {
            grid,
            mine_count: layout.mine_count(),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            triggered_mine: None,
        }
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.grid.dim();
        (
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn grid(&self) -> &Array2<CellRecord> {
        &self.grid
    }

    pub fn cell_at(&self, coords: Coord2) -> CellRecord {
        self.grid[coords.to_nd_index()]
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        mult(self.size().0, self.size().1) - self.mine_count
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count.0
    }

    /// First mine seen revealed, if any.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn is_lost(&self) -> bool {
        self.triggered_mine.is_some()
    }

    /// Revealed mines are never counted toward the win, so only safe cells can complete the board.
    pub fn is_cleared(&self) -> bool {
        self.revealed_safe_count() == self.safe_cell_count()
    }

    /// Stores a report, keeping the counters in step with the grid.
    pub fn apply(&mut self, record: CellRecord) -> Result<()> {
        let coords = record.coords();
        let size = self.size();
        if coords.0 >= size.0 || coords.1 >= size.1 {
            return Err(GameError::InvalidCoords);
        }

        let previous = core::mem::replace(&mut self.grid[coords.to_nd_index()], record);

        match (previous.revealed, record.revealed) {
            (false, true) => self.revealed_count += 1,
            (true, false) => {
                log::warn!("cell {:?} reported as covered again", coords);
                self.revealed_count -= 1;
            }
            _ => {}
        }
        match (previous.flagged, record.flagged) {
            (false, true) => self.flagged_count += 1,
            (true, false) => self.flagged_count -= 1,
            _ => {}
        }

        if record.is_detonated() && self.triggered_mine.is_none() {
            self.triggered_mine = Some(coords);
        }

        Ok(())
    }

    fn revealed_safe_count(&self) -> CellCount {
        if self.triggered_mine.is_none() {
            return self.revealed_count.0;
        }
        self.grid
            .iter()
            .filter(|cell| cell.revealed && !cell.is_mine)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }
}

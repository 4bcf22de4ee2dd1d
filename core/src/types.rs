use ndarray::Array2;

/// One board axis. Boards are at most 255 cells wide or tall.
pub type Coord = u8;

/// Mine and cell totals; a full 255x255 board still fits.
pub type CellCount = u16;

/// Cell position as `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// Conversion into the index type `ndarray` expects.
pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        let (row, col) = self;
        [usize::from(row), usize::from(col)]
    }
}

/// Cell count of a `rows` x `cols` board.
pub const fn mult(rows: Coord, cols: Coord) -> CellCount {
    (rows as CellCount).saturating_mul(cols as CellCount)
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter {
        let (rows, cols) = self.dim();
        let clamp = |len: usize| Coord::try_from(len).unwrap_or(Coord::MAX);
        NeighborIter::new(center, (clamp(rows), clamp(cols)))
    }
}

/// Row-major walk over the 3x3 block around `center`, clipped to the board and skipping `center`.
///
/// A center outside `bounds` has no neighbors.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    first_col: Coord,
    last: Coord2,
    cursor: Option<Coord2>,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        let (row, col) = center;
        let (rows, cols) = bounds;

        let cursor = (row < rows && col < cols)
            .then(|| (row.saturating_sub(1), col.saturating_sub(1)));
        let last = (
            row.saturating_add(1).min(rows.saturating_sub(1)),
            col.saturating_add(1).min(cols.saturating_sub(1)),
        );

        Self {
            center,
            first_col: col.saturating_sub(1),
            last,
            cursor,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.cursor?;
            let (row, col) = current;

            self.cursor = if col < self.last.1 {
                Some((row, col + 1))
            } else if row < self.last.0 {
                Some((row + 1, self.first_col))
            } else {
                None
            };

            if current != self.center {
                return Some(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_three_neighbors() {
        let neighbors: Vec<_> = NeighborIter::new((0, 0), (3, 3)).collect();
        assert_eq!(neighbors, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn center_neighbors_come_in_row_major_order() {
        let neighbors: Vec<_> = NeighborIter::new((1, 1), (3, 3)).collect();
        assert_eq!(
            neighbors,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn single_row_board_only_has_horizontal_neighbors() {
        let neighbors: Vec<_> = NeighborIter::new((0, 2), (1, 4)).collect();
        assert_eq!(neighbors, vec![(0, 1), (0, 3)]);
    }

    #[test]
    fn far_corner_and_lone_cell() {
        let neighbors: Vec<_> = NeighborIter::new((2, 4), (3, 5)).collect();
        assert_eq!(neighbors, vec![(1, 3), (1, 4), (2, 3)]);

        assert_eq!(NeighborIter::new((0, 0), (1, 1)).count(), 0);
        assert_eq!(NeighborIter::new((3, 0), (3, 3)).count(), 0);
    }

    #[test]
    fn array_neighbors_use_array_shape() {
        let grid: Array2<bool> = Array2::default((2, 2));
        assert_eq!(grid.iter_neighbors((1, 1)).count(), 3);
    }

    #[test]
    fn largest_board_cell_count_fits() {
        assert_eq!(mult(9, 9), 81);
        assert_eq!(mult(255, 255), 65025);
    }
}

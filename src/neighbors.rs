//! Per-player neighborhood precomputation.

use crate::geometry::Point2D;
use crate::grid::GridSpatialIndex;
use rayon::prelude::*;

/// The K nearest players of every player, in one compact buffer.
///
/// Rows are fixed-stride `u32` slices ordered by distance, so the trial loop
/// walks them without chasing pointers. A player appears in its own row
/// (distance 0 sorts first); the interest derivation skips it through the
/// own-set membership check.
#[derive(Debug, Clone, Default)]
pub(crate) struct NeighborTable {
    stride: usize,
    data: Vec<u32>,
}

impl NeighborTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Query the index for every player's `k` nearest players.
    ///
    /// The index is immutable here, so the per-player queries fan out over
    /// the rayon pool.
    pub fn build(index: &GridSpatialIndex<u32>, positions: &[Point2D], k: usize) -> Self {
        let stride = k.min(positions.len());
        let rows: Vec<Vec<u32>> = positions
            .par_iter()
            .map(|p| index.query_by_count(p.x, p.y, stride))
            .collect();

        let mut data = Vec::with_capacity(stride * positions.len());
        for row in &rows {
            debug_assert_eq!(row.len(), stride);
            data.extend_from_slice(row);
        }
        Self { stride, data }
    }

    /// The neighbor row of `player`, nearest first.
    pub fn of(&self, player: usize) -> &[u32] {
        &self.data[player * self.stride..(player + 1) * self.stride]
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridSpatialIndex;

    fn index_of(positions: &[Point2D]) -> GridSpatialIndex<u32> {
        let mut index = GridSpatialIndex::new(3, 64.0, 64.0);
        for (i, p) in positions.iter().enumerate() {
            index.insert(i as u32, p.x, p.y).unwrap();
        }
        index
    }

    #[test]
    fn rows_start_with_the_player_itself() {
        let positions = vec![
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(40.0, 40.0),
        ];
        let table = NeighborTable::build(&index_of(&positions), &positions, 2);

        assert_eq!(table.stride(), 2);
        assert_eq!(table.of(0), &[0, 1]);
        assert_eq!(table.of(1), &[1, 0]);
        assert_eq!(table.of(2), &[2, 1]);
    }

    #[test]
    fn stride_is_capped_by_the_player_count() {
        let positions = vec![Point2D::new(1.0, 1.0), Point2D::new(2.0, 1.0)];
        let table = NeighborTable::build(&index_of(&positions), &positions, 100);
        assert_eq!(table.stride(), 2);
        assert_eq!(table.of(1), &[1, 0]);
    }

    #[test]
    fn duplicate_positions_tie_break_by_insertion_order() {
        let positions = vec![Point2D::new(5.0, 5.0), Point2D::new(5.0, 5.0)];
        let table = NeighborTable::build(&index_of(&positions), &positions, 2);
        assert_eq!(table.of(0), &[0, 1]);
        assert_eq!(table.of(1), &[0, 1]);
    }
}

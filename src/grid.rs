//! Uniform bucket grid over a rectangular board.
//!
//! Cells are square with a power-of-two side, so locating the cell of a
//! non-negative coordinate is a single right shift. The board covers
//! `[0, width) × [0, height)`; callers normalize positions before inserting
//! (see [`Partitioner::set_positions`](crate::Partitioner::set_positions)).

use crate::Error;
use std::collections::HashMap;
use std::hash::Hash;

/// Outcome of [`GridSpatialIndex::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The key was not in the index before.
    Inserted,
    /// The key was already indexed; its coordinates were refreshed and the
    /// entry moved cells if needed.
    Updated,
}

/// Candidate filtering applied by [`GridSpatialIndex::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// Every entry of every touched cell, unfiltered.
    Raw,
    /// Euclidean distance to the query point at most `radius`.
    Circle,
    /// Both coordinate deltas at most `radius` in absolute value.
    Square,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    x: f64,
    y: f64,
    /// Back-pointer to the owning cell, as an index into the cell array.
    cell: usize,
    /// Creation order, used to break distance ties deterministically.
    seq: u64,
}

/// A spatial index with fixed-size square cells.
///
/// # Example
///
/// ```
/// use shardplan::{GridSpatialIndex, Insertion};
///
/// // 16-unit cells over a 64x64 board.
/// let mut index = GridSpatialIndex::new(4, 64.0, 64.0);
/// assert_eq!(index.insert(7_usize, 3.0, 3.0), Ok(Insertion::Inserted));
/// assert_eq!(index.insert(9_usize, 19.0, 3.0), Ok(Insertion::Inserted));
///
/// // Nearest first.
/// assert_eq!(index.query_by_count(0.0, 0.0, 2), vec![7, 9]);
/// ```
#[derive(Debug)]
pub struct GridSpatialIndex<K> {
    cell_size_exponent: u32,
    width: f64,
    height: f64,
    width_in_cells: usize,
    height_in_cells: usize,
    cells: Vec<Vec<K>>,
    entries: HashMap<K, Entry>,
    next_seq: u64,
}

impl<K> GridSpatialIndex<K>
where
    K: Copy + Eq + Hash,
{
    /// Create an empty index over a `width` by `height` board with cells of
    /// side `2^cell_size_exponent`, in the same units as the coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size_exponent` does not leave room for a coordinate
    /// mantissa, or if a board dimension is negative or not finite.
    pub fn new(cell_size_exponent: u32, width: f64, height: f64) -> Self {
        assert!(cell_size_exponent < 32, "cell size exponent out of range");
        assert!(width >= 0.0 && width.is_finite(), "invalid board width");
        assert!(height >= 0.0 && height.is_finite(), "invalid board height");

        let cell_size = (1_u64 << cell_size_exponent) as f64;
        let width_in_cells = (width / cell_size).ceil() as usize;
        let height_in_cells = (height / cell_size).ceil() as usize;

        Self {
            cell_size_exponent,
            width,
            height,
            width_in_cells,
            height_in_cells,
            cells: vec![Vec::new(); width_in_cells * height_in_cells],
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    /// The number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn width_in_cells(&self) -> usize {
        self.width_in_cells
    }

    pub fn height_in_cells(&self) -> usize {
        self.height_in_cells
    }

    #[inline]
    fn cell_of(&self, x: f64, y: f64) -> usize {
        let e = self.cell_size_exponent;
        let col = (x as usize) >> e;
        let row = (y as usize) >> e;
        row * self.width_in_cells + col
    }

    #[inline]
    fn in_bounds(&self, x: f64, y: f64) -> bool {
        0.0 <= x && x < self.width && 0.0 <= y && y < self.height
    }

    /// Index `key` at `(x, y)`.
    ///
    /// Re-inserting a known key refreshes its coordinates and, when the
    /// coordinates land in a different cell, migrates the entry there.
    ///
    /// Fails with [`Error::OutOfBounds`] for coordinates outside
    /// `[0, width) × [0, height)`.
    pub fn insert(&mut self, key: K, x: f64, y: f64) -> Result<Insertion, Error> {
        if !self.in_bounds(x, y) {
            return Err(Error::OutOfBounds { x, y });
        }
        let cell = self.cell_of(x, y);
        debug_assert!(cell < self.cells.len());

        if let Some(entry) = self.entries.get_mut(&key) {
            let old_cell = entry.cell;
            entry.x = x;
            entry.y = y;
            if old_cell != cell {
                entry.cell = cell;
                detach(&mut self.cells[old_cell], &key);
                self.cells[cell].push(key);
            }
            return Ok(Insertion::Updated);
        }

        self.entries.insert(
            key,
            Entry {
                x,
                y,
                cell,
                seq: self.next_seq,
            },
        );
        self.next_seq += 1;
        self.cells[cell].push(key);
        Ok(Insertion::Inserted)
    }

    /// Drop `key` from the index. Returns whether anything was removed.
    ///
    /// The cell-side slot and the key-map entry are released together.
    pub fn remove(&mut self, key: K) -> bool {
        match self.entries.remove(&key) {
            Some(entry) => {
                detach(&mut self.cells[entry.cell], &key);
                true
            }
            None => false,
        }
    }

    /// All keys within `radius` of `(x, y)`, filtered by `shape`.
    ///
    /// The candidate set is every entry of every cell touched by the
    /// axis-aligned square `[x-r, x+r] × [y-r, y+r]` clipped to the board.
    /// Ordering of the result is unspecified.
    pub fn query(&self, x: f64, y: f64, radius: f64, shape: QueryShape) -> Vec<K> {
        if self.cells.is_empty() || radius < 0.0 {
            return Vec::new();
        }
        let e = self.cell_size_exponent;
        let min_x = (x - radius).clamp(0.0, self.width);
        let max_x = (x + radius).clamp(0.0, self.width);
        let min_y = (y - radius).clamp(0.0, self.height);
        let max_y = (y + radius).clamp(0.0, self.height);

        let col0 = ((min_x as usize) >> e).min(self.width_in_cells - 1);
        let col1 = ((max_x as usize) >> e).min(self.width_in_cells - 1);
        let row0 = ((min_y as usize) >> e).min(self.height_in_cells - 1);
        let row1 = ((max_y as usize) >> e).min(self.height_in_cells - 1);

        let radius_squared = radius * radius;
        let mut found = Vec::new();
        for row in row0..=row1 {
            for col in col0..=col1 {
                for key in &self.cells[row * self.width_in_cells + col] {
                    let entry = &self.entries[key];
                    let keep = match shape {
                        QueryShape::Raw => true,
                        QueryShape::Circle => {
                            let dx = entry.x - x;
                            let dy = entry.y - y;
                            dx * dx + dy * dy <= radius_squared
                        }
                        QueryShape::Square => {
                            (entry.x - x).abs() <= radius && (entry.y - y).abs() <= radius
                        }
                    };
                    if keep {
                        found.push(*key);
                    }
                }
            }
        }
        found
    }

    /// The `k` keys nearest to `(x, y)`, ordered by squared distance
    /// ascending, distance ties broken by insertion order.
    ///
    /// Grows a square ring of cells around the query cell, collecting every
    /// entry of every touched cell, until enough candidates are gathered or
    /// the rings have exhausted the grid; near the board edges fewer than `k`
    /// keys may come back.
    pub fn query_by_count(&self, x: f64, y: f64, k: usize) -> Vec<K> {
        if k == 0 || self.cells.is_empty() {
            return Vec::new();
        }
        let e = self.cell_size_exponent;
        let center_col = ((x.max(0.0) as usize) >> e).min(self.width_in_cells - 1);
        let center_row = ((y.max(0.0) as usize) >> e).min(self.height_in_cells - 1);

        let mut candidates: Vec<(f64, u64, K)> = Vec::new();
        for level in 1.. {
            let mut produced = false;
            for (col, row) in self.ring(center_col, center_row, level) {
                produced = true;
                for key in &self.cells[row * self.width_in_cells + col] {
                    let entry = &self.entries[key];
                    let dx = entry.x - x;
                    let dy = entry.y - y;
                    candidates.push((dx * dx + dy * dy, entry.seq, *key));
                }
            }
            if !produced || candidates.len() >= k {
                break;
            }
        }

        candidates.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        candidates.truncate(k);
        candidates.into_iter().map(|(_, _, key)| key).collect()
    }

    /// The cells of the ring at `level` around a center cell, clipped to the
    /// grid. Level 1 is the center cell alone.
    pub fn ring(&self, center_col: usize, center_row: usize, level: usize) -> CellRing {
        CellRing::new(
            center_col,
            center_row,
            level,
            self.width_in_cells,
            self.height_in_cells,
        )
    }
}

fn detach<K: Eq>(cell: &mut Vec<K>, key: &K) {
    if let Some(slot) = cell.iter().position(|k| k == key) {
        cell.swap_remove(slot);
    }
}

/// An iterator over the cells at one Chebyshev ring around a center cell.
///
/// This type is returned by [`GridSpatialIndex::ring`]. Internal state is the
/// four unclamped ring bounds and a row/column cursor; out-of-grid cells are
/// skipped on the fly.
#[derive(Debug, Clone)]
pub struct CellRing {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
    cols: i64,
    rows: i64,
    col: i64,
    row: i64,
    done: bool,
}

impl CellRing {
    fn new(center_col: usize, center_row: usize, level: usize, cols: usize, rows: usize) -> Self {
        assert!(level >= 1, "ring levels start at 1");
        let d = (level - 1) as i64;
        let left = center_col as i64 - d;
        let top = center_row as i64 - d;
        Self {
            left,
            right: center_col as i64 + d,
            top,
            bottom: center_row as i64 + d,
            cols: cols as i64,
            rows: rows as i64,
            col: left,
            row: top,
            done: cols == 0 || rows == 0,
        }
    }

    fn advance(&mut self) {
        if self.row == self.top || self.row == self.bottom {
            // full row
            if self.col < self.right {
                self.col += 1;
            } else {
                self.row += 1;
                self.col = self.left;
            }
        } else if self.col == self.left {
            // interior row: hop across to the right border
            self.col = self.right;
        } else {
            self.row += 1;
            self.col = self.left;
        }
        if self.row > self.bottom {
            self.done = true;
        }
    }
}

impl Iterator for CellRing {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        while !self.done {
            let (col, row) = (self.col, self.row);
            self.advance();
            if 0 <= col && col < self.cols && 0 <= row && row < self.rows {
                return Some((col as usize, row as usize));
            }
        }
        None
    }
}

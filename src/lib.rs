//! A capacity-planning library for clustered game servers.
//!
//! Given a snapshot of 2D player positions, shardplan explores random
//! placements of server *focuses* (shard anchors), assigns every player to its
//! nearest focus, and keeps the placement that minimizes cross-shard state
//! forwarding while every focus stays under a configured load ceiling.
//!
//! # Crate Layout
//!
//! The crate is built from three tightly-coupled subsystems:
//!
//! - [`grid`] — a uniform bucket [`GridSpatialIndex`] with keyed inserts and a
//!   ring-expansion k-nearest-neighbor query.
//! - Neighborhood precomputation — for each player, the list of its K nearest
//!   players, built once per dataset and read during every trial.
//! - [`Partitioner`] — the randomized trial loop: place focuses, assign
//!   players (a discrete Voronoi), derive per-focus interest sets, score by
//!   forwarding cost subject to a load-factor cap, and keep the best
//!   [`Snapshot`].
//!
//! Supporting modules: [`geometry`] (points and bounding boxes), [`hull`]
//! (the convex-hull seam used to outline each shard), and [`input`] (the
//! tab-separated position format).
//!
//! # Example
//!
//! ```
//! use shardplan::{Partitioner, Point2D, Settings};
//!
//! let settings = Settings {
//!     focus_count: 2,
//!     ..Settings::default()
//! };
//! let mut partitioner = Partitioner::new(settings, rand::rng()).unwrap();
//! partitioner.set_positions(vec![
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 0.0),
//!     Point2D::new(0.0, 10.0),
//!     Point2D::new(10.0, 10.0),
//! ]).unwrap();
//!
//! for _ in 0..16 {
//!     partitioner.randomize().unwrap();
//! }
//!
//! let best = partitioner.best_snapshot().unwrap();
//! let assigned: usize = (0..best.focus_count())
//!     .map(|focus| best.own_players(focus).len())
//!     .sum();
//! assert_eq!(assigned, 4);
//! ```

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    rust_2018_idioms
)]

pub mod geometry;
pub mod grid;
pub mod hull;
pub mod input;

mod neighbors;
mod partitioner;
mod snapshot;

pub use crate::geometry::distance_squared;
pub use crate::geometry::BoundingBox;
pub use crate::geometry::Point2D;
pub use crate::grid::GridSpatialIndex;
pub use crate::grid::Insertion;
pub use crate::grid::QueryShape;
pub use crate::hull::HullBuilder;
pub use crate::hull::MonotoneChain;
pub use crate::partitioner::Partitioner;
pub use crate::partitioner::PlacementStrategy;
pub use crate::partitioner::Settings;
pub use crate::partitioner::TrialOutcome;
pub use crate::snapshot::PlayerSet;
pub use crate::snapshot::Snapshot;

pub use nalgebra;
pub use rand;
pub use rayon;

use std::fmt;

/// Common errors thrown by the index and the partitioner.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// An insert was attempted outside the indexed board.
    ///
    /// The caller guarantees positions are normalized before they reach the
    /// index, so this is a programmer error rather than a data error.
    OutOfBounds { x: f64, y: f64 },

    /// A trial was requested before any positions were loaded.
    EmptyDataset,

    /// The configured focus count is zero.
    InvalidFocusCount,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { x, y } => {
                write!(f, "position ({x}, {y}) is outside the indexed board")
            }
            Self::EmptyDataset => write!(f, "no positions loaded"),
            Self::InvalidFocusCount => write!(f, "focus count must be at least 1"),
        }
    }
}

impl std::error::Error for Error {}

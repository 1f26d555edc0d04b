//! Randomized focus placement and trial scoring.

use crate::geometry::distance_squared;
use crate::geometry::BoundingBox;
use crate::geometry::Point2D;
use crate::grid::GridSpatialIndex;
use crate::hull::HullBuilder;
use crate::hull::MonotoneChain;
use crate::neighbors::NeighborTable;
use crate::snapshot::Snapshot;
use crate::Error;
use rand::seq::IndexedRandom as _;
use rand::Rng;
use std::time::Duration;
use std::time::Instant;

/// How one focus position is drawn within a trial.
///
/// Both strategies sample independently per focus, so two focuses may land on
/// the same spot; the duplicate then owns no player and stays degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// A uniform-random element of the loaded positions.
    PlayerPositions,
    /// A uniform-random point of the dataset's bounding box.
    BoundingBox,
}

impl PlacementStrategy {
    /// Draw one focus position in normalized coordinates.
    pub fn place_one<R>(
        &self,
        bounding_box: &BoundingBox,
        positions: &[Point2D],
        rng: &mut R,
    ) -> Point2D
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::PlayerPositions => positions
                .choose(rng)
                .copied()
                .unwrap_or_else(Point2D::origin),
            Self::BoundingBox => Point2D::new(
                rng.random_range(0.0..=bounding_box.width()),
                rng.random_range(0.0..=bounding_box.height()),
            ),
        }
    }
}

/// Tunable knobs of the partitioner.
///
/// # Example
///
/// ```
/// use shardplan::{PlacementStrategy, Settings};
///
/// let settings = Settings {
///     focus_count: 8,
///     strategy: PlacementStrategy::BoundingBox,
///     ..Settings::default()
/// };
/// assert_eq!(settings.neighbor_count, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// How many focuses each trial places. Must be at least 1.
    pub focus_count: usize,
    /// How focus positions are drawn.
    pub strategy: PlacementStrategy,
    /// Per-focus load ceiling, in percent of one CPU-second; a trial with any
    /// focus above it is rejected.
    pub max_comfortable_load_factor: f64,
    /// Cell side of the spatial index is `2^cell_size_exponent`, in position
    /// units. 13 to 14 is the sweet spot for centimeter units and typical
    /// player spacing.
    pub cell_size_exponent: u32,
    /// K in the per-player K-nearest-neighbor precomputation.
    pub neighbor_count: usize,
    /// Processing time per owned player per tick, in microseconds.
    pub proc_mine_micros: f64,
    /// Processing time per external-interest player per tick, in
    /// microseconds.
    pub proc_other_micros: f64,
    /// State-send frequency, in Hz.
    pub send_freq_hz: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_count: 4,
            strategy: PlacementStrategy::PlayerPositions,
            max_comfortable_load_factor: 50.0,
            cell_size_exponent: 13,
            neighbor_count: 100,
            proc_mine_micros: 20.0,
            proc_other_micros: 1.0,
            send_freq_hz: 5.0,
        }
    }
}

/// What one [`Partitioner::randomize`] trial amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The trial beat the best snapshot and replaced it.
    Improved,
    /// The trial stayed under the load cap but did not beat the best
    /// snapshot.
    NotImproved,
    /// Some focus exceeded the load cap; the trial was discarded.
    OverLoadCap,
}

impl TrialOutcome {
    /// Whether callers should re-read the best snapshot.
    pub fn is_improvement(self) -> bool {
        matches!(self, Self::Improved)
    }
}

/// Explores random focus placements over a loaded set of player positions
/// and retains the best partition found.
///
/// The partitioner owns the positions (normalized so the minimum coordinate
/// is 0), their bounding box, the spatial index, the per-player neighbor
/// lists, and the best [`Snapshot`] so far. Index and neighborhoods are
/// rebuilt by [`set_positions`](Self::set_positions) and read-only during
/// trials; each [`randomize`](Self::randomize) call runs exactly one trial.
#[derive(Debug)]
pub struct Partitioner<R, H = MonotoneChain> {
    settings: Settings,
    rng: R,
    positions: Vec<Point2D>,
    bounding_box: BoundingBox,
    index: GridSpatialIndex<u32>,
    neighbors: NeighborTable,
    best: Option<Snapshot<H>>,
    runs: usize,
    failures: usize,
    total_elapsed: Duration,
}

impl<R> Partitioner<R, MonotoneChain>
where
    R: Rng,
{
    /// A partitioner with the default hull builder.
    pub fn new(settings: Settings, rng: R) -> Result<Self, Error> {
        Self::with_hull_builder(settings, rng)
    }
}

impl<R, H> Partitioner<R, H>
where
    R: Rng,
    H: HullBuilder + Default,
{
    /// A partitioner outlining its shards with hulls built by `H`.
    pub fn with_hull_builder(settings: Settings, rng: R) -> Result<Self, Error> {
        if settings.focus_count == 0 {
            return Err(Error::InvalidFocusCount);
        }
        Ok(Self {
            index: GridSpatialIndex::new(settings.cell_size_exponent, 0.0, 0.0),
            settings,
            rng,
            positions: Vec::new(),
            bounding_box: BoundingBox::new(),
            neighbors: NeighborTable::empty(),
            best: None,
            runs: 0,
            failures: 0,
            total_elapsed: Duration::ZERO,
        })
    }

    /// Load a dataset: normalize the positions so their minimum becomes
    /// `(0, 0)`, then rebuild the spatial index and the per-player neighbor
    /// lists.
    ///
    /// Any previous best snapshot and the trial counters are reset.
    pub fn set_positions(&mut self, mut positions: Vec<Point2D>) -> Result<(), Error> {
        let raw = BoundingBox::from_points(&positions);
        if !raw.is_empty() {
            let (left, top) = (raw.left(), raw.top());
            for p in &mut positions {
                p.x -= left;
                p.y -= top;
            }
        }
        let bounding_box = BoundingBox::from_points(&positions);

        // The board is one unit wider than the data so the maximal
        // coordinate stays strictly inside it.
        let mut index = GridSpatialIndex::new(
            self.settings.cell_size_exponent,
            bounding_box.width() + 1.0,
            bounding_box.height() + 1.0,
        );
        for (player, p) in positions.iter().enumerate() {
            index.insert(player as u32, p.x, p.y)?;
        }
        let neighbors = NeighborTable::build(&index, &positions, self.settings.neighbor_count);

        tracing::debug!(
            players = positions.len(),
            neighbor_stride = neighbors.stride(),
            "rebuilt spatial index and neighborhoods"
        );

        self.positions = positions;
        self.bounding_box = bounding_box;
        self.index = index;
        self.neighbors = neighbors;
        self.best = None;
        self.runs = 0;
        self.failures = 0;
        self.total_elapsed = Duration::ZERO;
        Ok(())
    }

    /// Run one randomized trial: place focuses, assign players, derive
    /// interest sets, score, and replace the best snapshot on improvement.
    ///
    /// Fails with [`Error::EmptyDataset`] when no positions are loaded.
    pub fn randomize(&mut self) -> Result<TrialOutcome, Error> {
        if self.positions.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let started = Instant::now();
        let Self {
            settings,
            bounding_box,
            positions,
            rng,
            ..
        } = &mut *self;
        let focuses: Vec<Point2D> = (0..settings.focus_count)
            .map(|_| settings.strategy.place_one(bounding_box, positions, rng))
            .collect();
        self.run_trial(started, focuses)
    }

    /// Steps 3 to 6 of a trial with the focus positions already chosen.
    ///
    /// `started` marks the beginning of the trial, so the elapsed counter
    /// covers focus placement too when the caller drew the focuses itself.
    fn run_trial(
        &mut self,
        started: Instant,
        focuses: Vec<Point2D>,
    ) -> Result<TrialOutcome, Error> {
        if self.positions.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let span = tracing::trace_span!("trial", run = self.runs);
        let _enter = span.enter();

        let focus_count = focuses.len();
        let mut snapshot = Snapshot::<H>::new(focus_count, self.positions.len());
        snapshot.focuses = focuses;

        // Nearest-focus assignment; the strict `<` sends distance ties to
        // the lowest focus index.
        for (player, position) in self.positions.iter().enumerate() {
            let mut nearest = 0;
            let mut nearest_distance = f64::INFINITY;
            for (focus, anchor) in snapshot.focuses.iter().enumerate() {
                let distance = distance_squared(position, anchor);
                if distance < nearest_distance {
                    nearest_distance = distance;
                    nearest = focus;
                }
            }
            snapshot.own[nearest].insert(player);
            snapshot.inner_hulls[nearest].add_point(*position);
            snapshot.outer_hulls[nearest].add_point(*position);
        }

        // External interest: neighbors of own players that live elsewhere.
        // A player's own row contains the player itself; the own-set check
        // skips it.
        {
            let Snapshot {
                own,
                external,
                outer_hulls,
                ..
            } = &mut snapshot;
            for focus in 0..focus_count {
                for player in own[focus].iter() {
                    for &neighbor in self.neighbors.of(player) {
                        let neighbor = neighbor as usize;
                        if !own[focus].contains(neighbor) && external[focus].insert(neighbor) {
                            outer_hulls[focus].add_point(self.positions[neighbor]);
                        }
                    }
                }
            }
        }

        let settings = &self.settings;
        let mut forwards = 0;
        let mut over_cap = false;
        for focus in 0..focus_count {
            let own_count = snapshot.own[focus].len() as f64;
            let external_count = snapshot.external[focus].len() as f64;
            let micros_per_second = settings.send_freq_hz
                * (own_count * settings.proc_mine_micros
                    + external_count * settings.proc_other_micros);
            let load_factor = 100.0 * micros_per_second / 1_000_000.0;
            snapshot.load_factors.push(load_factor);
            over_cap |= load_factor > settings.max_comfortable_load_factor;
            forwards += snapshot.external[focus].len();
        }

        self.runs += 1;
        self.total_elapsed += started.elapsed();

        if over_cap {
            snapshot.within_load_cap = false;
            self.failures += 1;
            tracing::trace!("trial rejected, load factor over cap");
            return Ok(TrialOutcome::OverLoadCap);
        }
        snapshot.forward_count = forwards;

        let improved = match &self.best {
            None => true,
            Some(best) => forwards < best.forward_count,
        };
        if improved {
            tracing::debug!(forwards, "accepted new best partition");
            self.best = Some(snapshot);
            Ok(TrialOutcome::Improved)
        } else {
            Ok(TrialOutcome::NotImproved)
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The loaded positions, normalized.
    pub fn positions(&self) -> &[Point2D] {
        &self.positions
    }

    /// Bounding box of the normalized positions.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn spatial_index(&self) -> &GridSpatialIndex<u32> {
        &self.index
    }

    /// The precomputed neighbor row of `player`, nearest first.
    pub fn neighbors_of(&self, player: usize) -> &[u32] {
        self.neighbors.of(player)
    }

    /// The best accepted snapshot so far, if any trial passed the load cap.
    pub fn best_snapshot(&self) -> Option<&Snapshot<H>> {
        self.best.as_ref()
    }

    /// Total trials run since the last dataset load.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Trials rejected for exceeding the load cap.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Wall-clock time spent inside trials.
    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }
}

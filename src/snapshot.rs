//! The result of one randomized partitioning trial.

use crate::geometry::Point2D;
use crate::hull::HullBuilder;
use crate::hull::MonotoneChain;
use itertools::Itertools as _;

/// A dense set of player indices.
///
/// Own-sets and interest-sets are sets of small integers that get probed on
/// every neighbor visit of a trial, so they are stored as a bitset rather
/// than a hash set. Iteration is in ascending index order, which keeps
/// everything emitted from a snapshot deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSet {
    blocks: Vec<u64>,
    len: usize,
}

impl PlayerSet {
    /// An empty set with room for players `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: vec![0; capacity.div_ceil(64)],
            len: 0,
        }
    }

    /// Add `player` to the set. Returns whether it was newly added.
    pub fn insert(&mut self, player: usize) -> bool {
        let block = player / 64;
        if block >= self.blocks.len() {
            self.blocks.resize(block + 1, 0);
        }
        let bit = 1_u64 << (player % 64);
        if self.blocks[block] & bit != 0 {
            return false;
        }
        self.blocks[block] |= bit;
        self.len += 1;
        true
    }

    pub fn contains(&self, player: usize) -> bool {
        match self.blocks.get(player / 64) {
            Some(block) => block & (1_u64 << (player % 64)) != 0,
            None => false,
        }
    }

    /// The number of players in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The players of the set, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().enumerate().flat_map(|(i, &block)| {
            let mut block = block;
            std::iter::from_fn(move || {
                if block == 0 {
                    return None;
                }
                let bit = block.trailing_zeros() as usize;
                block &= block - 1;
                Some(i * 64 + bit)
            })
        })
    }
}

/// Immutable-after-finalize record of one partitioning trial.
///
/// For each focus `i`, `own_players(i)` holds the players whose nearest focus
/// is `i`, and `external_interest(i)` the players that are not owned by `i`
/// but appear in the neighborhood of some player that is. A focus that ends
/// up owning nobody has empty sets, empty hulls and a load factor of 0;
/// consumers are expected to tolerate that.
#[derive(Debug, Clone)]
pub struct Snapshot<H = MonotoneChain> {
    pub(crate) focuses: Vec<Point2D>,
    pub(crate) own: Vec<PlayerSet>,
    pub(crate) external: Vec<PlayerSet>,
    pub(crate) inner_hulls: Vec<H>,
    pub(crate) outer_hulls: Vec<H>,
    pub(crate) load_factors: Vec<f64>,
    pub(crate) forward_count: usize,
    pub(crate) within_load_cap: bool,
}

impl<H> Snapshot<H>
where
    H: HullBuilder + Default,
{
    pub(crate) fn new(focus_count: usize, player_count: usize) -> Self {
        Self {
            focuses: Vec::with_capacity(focus_count),
            own: (0..focus_count)
                .map(|_| PlayerSet::with_capacity(player_count))
                .collect(),
            external: (0..focus_count)
                .map(|_| PlayerSet::with_capacity(player_count))
                .collect(),
            inner_hulls: (0..focus_count).map(|_| H::default()).collect(),
            outer_hulls: (0..focus_count).map(|_| H::default()).collect(),
            load_factors: Vec::with_capacity(focus_count),
            forward_count: 0,
            within_load_cap: true,
        }
    }
}

impl<H> Snapshot<H>
where
    H: HullBuilder,
{
    pub fn focus_count(&self) -> usize {
        self.focuses.len()
    }

    /// The focus positions of this trial, in normalized coordinates.
    pub fn focuses(&self) -> &[Point2D] {
        &self.focuses
    }

    /// The players owned by `focus`.
    pub fn own_players(&self, focus: usize) -> &PlayerSet {
        &self.own[focus]
    }

    /// The players `focus` needs but does not own.
    pub fn external_interest(&self, focus: usize) -> &PlayerSet {
        &self.external[focus]
    }

    /// Convex hull of the players owned by `focus`; empty for a degenerate
    /// focus.
    pub fn inner_hull(&self, focus: usize) -> Vec<Point2D> {
        self.inner_hulls[focus].hull()
    }

    /// Convex hull of owned plus external-interest players of `focus`.
    pub fn outer_hull(&self, focus: usize) -> Vec<Point2D> {
        self.outer_hulls[focus].hull()
    }

    /// Percent of one CPU-second `focus` spends on player processing per
    /// second at the configured tick rate.
    pub fn load_factor(&self, focus: usize) -> f64 {
        self.load_factors[focus]
    }

    pub fn load_factors(&self) -> &[f64] {
        &self.load_factors
    }

    /// Load factors of the least and most loaded focuses, `None` when the
    /// snapshot has no focuses.
    pub fn load_factor_spread(&self) -> Option<(f64, f64)> {
        self.load_factors
            .iter()
            .copied()
            .minmax_by(f64::total_cmp)
            .into_option()
    }

    /// Total cross-shard forwards of this trial, the minimization objective.
    pub fn forward_count(&self) -> usize {
        self.forward_count
    }

    /// Whether every focus stayed at or under the configured load cap.
    pub fn is_within_comfortable_load(&self) -> bool {
        self.within_load_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_set_insert_and_contains() {
        let mut set = PlayerSet::with_capacity(100);
        assert!(set.insert(3));
        assert!(set.insert(64));
        assert!(set.insert(99));
        assert!(!set.insert(3));

        assert_eq!(set.len(), 3);
        assert!(set.contains(3));
        assert!(set.contains(64));
        assert!(!set.contains(4));
        assert!(!set.contains(1000));
    }

    #[test]
    fn player_set_iterates_ascending() {
        let mut set = PlayerSet::with_capacity(200);
        for player in [150, 0, 63, 64, 7] {
            set.insert(player);
        }
        let players: Vec<usize> = set.iter().collect();
        assert_eq!(players, vec![0, 7, 63, 64, 150]);
    }

    #[test]
    fn player_set_grows_past_its_capacity() {
        let mut set = PlayerSet::with_capacity(1);
        assert!(set.insert(500));
        assert!(set.contains(500));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn load_factor_spread() {
        let mut snapshot: Snapshot = Snapshot::new(3, 4);
        snapshot.load_factors.extend([4.0, 1.0, 2.5]);
        assert_eq!(snapshot.load_factor_spread(), Some((1.0, 4.0)));

        let mut single: Snapshot = Snapshot::new(1, 4);
        single.load_factors.push(1.0);
        assert_eq!(single.load_factor_spread(), Some((1.0, 1.0)));

        let empty: Snapshot = Snapshot::new(0, 0);
        assert_eq!(empty.load_factor_spread(), None);
    }

    #[test]
    fn empty_snapshot_focus_is_degenerate() {
        let snapshot: Snapshot = Snapshot::new(2, 4);
        assert_eq!(snapshot.focus_count(), 0); // no focuses placed yet
        assert!(snapshot.own[1].is_empty());
        assert_eq!(snapshot.inner_hull(1), vec![]);
        assert_eq!(snapshot.outer_hull(1), vec![]);
    }
}

//! Convex-hull accumulation for shard outlines.
//!
//! The partitioner only needs `add a point, get the boundary back`, so the
//! seam is a small trait; [`MonotoneChain`] is the default implementation.

use crate::geometry::orientation;
use crate::geometry::Point2D;

/// Incremental 2D convex-hull accumulator.
///
/// `add_point` accepts an unbounded stream, repeats included; [`hull`]
/// returns the counter-clockwise outer boundary of everything added so far,
/// and is empty while fewer than 3 distinct non-collinear points were added.
///
/// [`hull`]: HullBuilder::hull
pub trait HullBuilder {
    fn add_point(&mut self, point: Point2D);

    fn hull(&self) -> Vec<Point2D>;
}

/// Andrew's monotone chain, O(n log n) in the number of accumulated points.
#[derive(Debug, Clone, Default)]
pub struct MonotoneChain {
    points: Vec<Point2D>,
}

impl MonotoneChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of accumulated points, duplicates included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl HullBuilder for MonotoneChain {
    fn add_point(&mut self, point: Point2D) {
        self.points.push(point);
    }

    fn hull(&self) -> Vec<Point2D> {
        let mut sorted = self.points.clone();
        sorted.sort_unstable_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
        sorted.dedup();

        if sorted.len() < 3 {
            return Vec::new();
        }

        // Lower and upper chains; strict turns drop collinear points.
        let mut lower: Vec<Point2D> = Vec::with_capacity(sorted.len());
        for p in &sorted {
            while lower.len() >= 2
                && orientation(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
            {
                lower.pop();
            }
            lower.push(*p);
        }

        let mut upper: Vec<Point2D> = Vec::with_capacity(sorted.len());
        for p in sorted.iter().rev() {
            while upper.len() >= 2
                && orientation(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
            {
                upper.pop();
            }
            upper.push(*p);
        }

        // Each chain ends where the other starts.
        lower.pop();
        upper.pop();
        lower.extend(upper);

        if lower.len() < 3 {
            return Vec::new();
        }
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(points: &[(f64, f64)]) -> MonotoneChain {
        let mut chain = MonotoneChain::new();
        for &(x, y) in points {
            chain.add_point(Point2D::new(x, y));
        }
        chain
    }

    #[test]
    fn hull_of_square_with_interior_point() {
        let chain = chain_of(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (2.0, 2.0),
        ]);
        let hull = chain.hull();
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point2D::new(2.0, 2.0)));
    }

    #[test]
    fn hull_is_counter_clockwise() {
        let chain = chain_of(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hull = chain.hull();
        for i in 0..hull.len() {
            let p = &hull[i];
            let q = &hull[(i + 1) % hull.len()];
            let r = &hull[(i + 2) % hull.len()];
            assert!(orientation(p, q, r) > 0.0);
        }
    }

    #[test]
    fn degenerate_inputs_have_empty_hulls() {
        assert_eq!(chain_of(&[]).hull(), vec![]);
        assert_eq!(chain_of(&[(1.0, 1.0)]).hull(), vec![]);
        assert_eq!(chain_of(&[(1.0, 1.0), (2.0, 2.0)]).hull(), vec![]);
        // collinear
        assert_eq!(
            chain_of(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]).hull(),
            vec![]
        );
        // duplicates of two distinct points
        assert_eq!(
            chain_of(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 0.0)]).hull(),
            vec![]
        );
    }

    #[test]
    fn repeats_do_not_change_the_boundary() {
        let once = chain_of(&[(0.0, 0.0), (4.0, 0.0), (2.0, 3.0)]);
        let repeated = chain_of(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (2.0, 3.0),
            (0.0, 0.0),
            (4.0, 0.0),
            (2.0, 3.0),
        ]);
        assert_eq!(once.hull(), repeated.hull());
        assert_eq!(once.hull().len(), 3);
    }

    #[test]
    fn every_input_point_is_inside_or_on_the_hull() {
        let points = [
            (4.0, 6.0),
            (9.0, 5.0),
            (1.2, 7.0),
            (0.0, 0.0),
            (3.0, 9.0),
            (4.0, 3.0),
            (1.0, 2.0),
        ];
        let hull = chain_of(&points).hull();
        assert!(hull.len() >= 3);
        for &(x, y) in &points {
            let p = Point2D::new(x, y);
            for i in 0..hull.len() {
                let a = &hull[i];
                let b = &hull[(i + 1) % hull.len()];
                assert!(orientation(a, b, &p) >= 0.0);
            }
        }
    }
}

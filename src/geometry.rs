//! A few useful geometric types

use rayon::prelude::*;

pub type Point2D = nalgebra::Point2<f64>;

/// Squared Euclidean distance between two points.
///
/// The partitioner only ever compares distances, so the square root is never
/// taken.
#[inline]
pub fn distance_squared(a: &Point2D, b: &Point2D) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Cross product of `(q - p)` and `(r - p)`.
///
/// Positive when `p`, `q`, `r` make a counter-clockwise turn, negative when
/// clockwise, zero when collinear.
#[inline]
pub fn orientation(p: &Point2D, q: &Point2D, r: &Point2D) -> f64 {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

/// An axis-aligned bounding box accumulated over a stream of points.
///
/// A freshly created box is empty: its minimum sits at `+∞`, its maximum at
/// `-∞`, and both [`width`](Self::width) and [`height`](Self::height) are 0.
/// Every [`add`](Self::add) grows the box so that it covers the point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    p_min: Point2D,
    p_max: Point2D,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// An empty box covering no point.
    pub fn new() -> Self {
        Self {
            p_min: Point2D::new(f64::INFINITY, f64::INFINITY),
            p_max: Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// The smallest box that contains every point of the slice.
    ///
    /// Returns an empty box for an empty slice.
    pub fn from_points(points: &[Point2D]) -> Self {
        points
            .par_iter()
            .fold(Self::new, |mut bb, p| {
                bb.add(*p);
                bb
            })
            .reduce(Self::new, Self::merge)
    }

    /// Grow the box to cover `point`.
    pub fn add(&mut self, point: Point2D) {
        if point.x < self.p_min.x {
            self.p_min.x = point.x;
        }
        if point.y < self.p_min.y {
            self.p_min.y = point.y;
        }
        if self.p_max.x < point.x {
            self.p_max.x = point.x;
        }
        if self.p_max.y < point.y {
            self.p_max.y = point.y;
        }
    }

    /// The smallest box covering both operands.
    pub fn merge(mut self, other: Self) -> Self {
        self.add(other.p_min);
        self.add(other.p_max);
        self
    }

    pub fn left(&self) -> f64 {
        self.p_min.x
    }

    pub fn right(&self) -> f64 {
        self.p_max.x
    }

    pub fn top(&self) -> f64 {
        self.p_min.y
    }

    pub fn bottom(&self) -> f64 {
        self.p_max.y
    }

    /// Horizontal extent, 0 for an empty box.
    pub fn width(&self) -> f64 {
        (self.p_max.x - self.p_min.x).max(0.0)
    }

    /// Vertical extent, 0 for an empty box.
    pub fn height(&self) -> f64 {
        (self.p_max.y - self.p_min.y).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn empty_box_has_zero_extent() {
        let bb = BoundingBox::new();
        assert!(bb.is_empty());
        assert_eq!(bb.width(), 0.0);
        assert_eq!(bb.height(), 0.0);
        assert_eq!(bb.left(), f64::INFINITY);
        assert_eq!(bb.right(), f64::NEG_INFINITY);
    }

    #[test]
    fn add_covers_every_input() {
        let points = vec![
            Point2D::new(1.0, 2.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(3.0, 1.0),
            Point2D::new(5.0, 4.0),
            Point2D::new(4.0, 5.0),
        ];

        let mut bb = BoundingBox::new();
        for p in &points {
            bb.add(*p);
        }

        for p in &points {
            assert!(bb.left() <= p.x && p.x <= bb.right());
            assert!(bb.top() <= p.y && p.y <= bb.bottom());
        }
        assert_ulps_eq!(bb.width(), 5.0);
        assert_ulps_eq!(bb.height(), 5.0);
    }

    #[test]
    fn from_points_matches_streaming_add() {
        let points = vec![
            Point2D::new(-1.3, 6.0),
            Point2D::new(2.0, -4.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(-3.0, -2.5),
        ];

        let bb = BoundingBox::from_points(&points);
        let mut streamed = BoundingBox::new();
        for p in &points {
            streamed.add(*p);
        }

        assert_eq!(bb, streamed);
        assert_ulps_eq!(bb.left(), -3.0);
        assert_ulps_eq!(bb.bottom(), 6.0);
    }

    #[test]
    fn single_point_box_is_degenerate_but_not_empty() {
        let bb = BoundingBox::from_points(&[Point2D::new(5.0, 5.0)]);
        assert!(!bb.is_empty());
        assert_eq!(bb.width(), 0.0);
        assert_eq!(bb.height(), 0.0);
        assert_ulps_eq!(bb.left(), 5.0);
    }

    #[test]
    fn distance_squared_is_symmetric() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert_ulps_eq!(distance_squared(&a, &b), 25.0);
        assert_ulps_eq!(distance_squared(&b, &a), 25.0);
        assert_eq!(distance_squared(&a, &a), 0.0);
    }

    #[test]
    fn orientation_sign() {
        let p = Point2D::new(0.0, 0.0);
        let q = Point2D::new(1.0, 0.0);
        assert!(orientation(&p, &q, &Point2D::new(1.0, 1.0)) > 0.0);
        assert!(orientation(&p, &q, &Point2D::new(1.0, -1.0)) < 0.0);
        assert_eq!(orientation(&p, &q, &Point2D::new(2.0, 0.0)), 0.0);
    }
}

//! Ground-plane bounds of the obstacle grid.
//!
//! Bounds are recomputed from scratch on every grid rebuild. They cover the
//! obstacle cloud and every anchor position (robot, path start, target),
//! expanded by a clearance margin so that an inflated obstacle or the robot
//! footprint at the border still lands inside the grid.

use super::point::WorldPoint;

/// Axis-aligned rectangle in the `(x, z)` ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl WorldBounds {
    /// Create bounds from explicit extents.
    #[inline]
    pub const fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Empty (inverted) bounds that expand to fit any point.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_z: f32::INFINITY,
            max_z: f32::NEG_INFINITY,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_z > self.max_z
    }

    /// Grow to include a point. Non-finite points are ignored.
    #[inline]
    pub fn expand_to_include(&mut self, p: WorldPoint) {
        if !p.x.is_finite() || !p.z.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_z = self.min_z.min(p.z);
        self.max_z = self.max_z.max(p.z);
    }

    /// Grow by `margin` meters on every side.
    #[inline]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_z: self.min_z - margin,
            max_z: self.max_z + margin,
        }
    }

    /// Bounds enclosing every point and anchor, plus `margin`.
    ///
    /// Falls back to a square around the origin when there is nothing to
    /// enclose, so callers always receive a usable extent.
    pub fn enclosing<P, A>(points: P, anchors: A, margin: f32) -> Self
    where
        P: IntoIterator<Item = WorldPoint>,
        A: IntoIterator<Item = WorldPoint>,
    {
        let mut bounds = Self::empty();
        for p in points.into_iter().chain(anchors) {
            bounds.expand_to_include(p);
        }
        if bounds.is_empty() {
            bounds = Self::new(0.0, 0.0, 0.0, 0.0);
        }
        bounds.expanded(margin.max(0.0))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    /// True if the point lies inside or on the border.
    #[inline]
    pub fn contains(&self, p: WorldPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    /// Grid dimensions `(cols, rows)` for a cell size.
    ///
    /// One extra cell per axis keeps the max edge addressable.
    pub fn grid_size(&self, cell_size: f32) -> (usize, usize) {
        if self.is_empty() || !(cell_size > 0.0) {
            return (0, 0);
        }
        let cols = (self.width() / cell_size).floor() as usize + 1;
        let rows = (self.depth() / cell_size).floor() as usize + 1;
        (cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_enclosing_contains_points_and_anchors() {
        let points = vec![WorldPoint::new(1.0, 2.0), WorldPoint::new(-1.0, 0.5)];
        let anchors = [WorldPoint::new(3.0, -2.0)];
        let bounds = WorldBounds::enclosing(points.iter().copied(), anchors, 0.1);

        assert_relative_eq!(bounds.min_x, -1.1);
        assert_relative_eq!(bounds.max_x, 3.1);
        assert_relative_eq!(bounds.min_z, -2.1);
        assert_relative_eq!(bounds.max_z, 2.1);
    }

    #[test]
    fn test_enclosing_nothing_is_origin_square() {
        let bounds = WorldBounds::enclosing(std::iter::empty(), std::iter::empty(), 0.5);
        assert!(!bounds.is_empty());
        assert!(bounds.contains(WorldPoint::ZERO));
        assert_relative_eq!(bounds.width(), 1.0);
    }

    #[test]
    fn test_non_finite_ignored() {
        let bounds = WorldBounds::enclosing(
            [WorldPoint::new(f32::NAN, 1.0), WorldPoint::new(0.0, 0.0)],
            std::iter::empty(),
            0.0,
        );
        assert_relative_eq!(bounds.width(), 0.0);
    }

    #[test]
    fn test_grid_size_covers_max_edge() {
        let bounds = WorldBounds::new(0.0, 1.0, 0.0, 0.5);
        let (cols, rows) = bounds.grid_size(0.25);
        assert_eq!(cols, 5);
        assert_eq!(rows, 3);
        assert_eq!(WorldBounds::empty().grid_size(0.25), (0, 0));
    }
}

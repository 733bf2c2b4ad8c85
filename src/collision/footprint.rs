//! Oriented rectangular footprint test.

use std::f32::consts::PI;

use crate::core::GridCoord;
use crate::grid::ObstacleGrid;

/// Slack on barycentric weights so cells lying on an edge count as inside.
const BARYCENTRIC_EPSILON: f32 = 1e-3;

/// Robot outline in grid cells, centered on the robot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    /// Half extent along the heading
    pub half_length: f32,
    /// Half extent across the heading
    pub half_width: f32,
}

impl Footprint {
    pub fn new(half_length: f32, half_width: f32) -> Self {
        Self {
            half_length,
            half_width,
        }
    }

    /// Corner offsets in order around the rectangle.
    pub fn corners(&self) -> [(f32, f32); 4] {
        let (l, w) = (self.half_length, self.half_width);
        [(l, w), (-l, w), (-l, -w), (l, -w)]
    }

    /// Distance from the center to a corner (cells).
    #[inline]
    pub fn half_diagonal(&self) -> f32 {
        self.half_length.hypot(self.half_width)
    }
}

/// Tests whether the footprint placed at a cell with a heading overlaps
/// occupied cells.
#[derive(Clone, Debug)]
pub struct FootprintChecker {
    footprint: Footprint,
    corners: [(f32, f32); 4],
    collision_threshold: usize,
}

impl FootprintChecker {
    pub fn new(footprint: Footprint, collision_threshold: usize) -> Self {
        Self {
            footprint,
            corners: footprint.corners(),
            collision_threshold: collision_threshold.max(1),
        }
    }

    #[inline]
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    #[inline]
    pub fn collision_threshold(&self) -> usize {
        self.collision_threshold
    }

    /// `false` for a heading outside `(-π, π]` or when at least
    /// `collision_threshold` occupied cells lie under the footprint.
    pub fn is_pose_valid(&self, grid: &ObstacleGrid, cell_x: i32, cell_y: i32, yaw: f32) -> bool {
        if !(yaw > -PI && yaw <= PI) {
            return false;
        }
        self.count_hits(grid, cell_x, cell_y, yaw, self.collision_threshold) < self.collision_threshold
    }

    /// Number of occupied cells under the footprint, without early exit.
    pub fn occupied_under(&self, grid: &ObstacleGrid, cell_x: i32, cell_y: i32, yaw: f32) -> usize {
        self.count_hits(grid, cell_x, cell_y, yaw, usize::MAX)
    }

    fn count_hits(
        &self,
        grid: &ObstacleGrid,
        cell_x: i32,
        cell_y: i32,
        yaw: f32,
        limit: usize,
    ) -> usize {
        if grid.is_empty() {
            return 0;
        }

        let (sin, cos) = yaw.sin_cos();
        let (cx, cy) = (cell_x as f32, cell_y as f32);
        let c = self
            .corners
            .map(|(dx, dy)| (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos));

        let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
        let (mut min_y, mut max_y) = (f32::MAX, f32::MIN);
        for &(x, y) in &c {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        let x0 = (min_x.floor() as i32).max(0);
        let x1 = (max_x.ceil() as i32).min(grid.cols() as i32 - 1);
        let y0 = (min_y.floor() as i32).max(0);
        let y1 = (max_y.ceil() as i32).min(grid.rows() as i32 - 1);

        let mut hits = 0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if !grid.is_occupied(GridCoord::new(x, y)) {
                    continue;
                }
                let p = (x as f32, y as f32);
                if in_triangle(p, c[0], c[1], c[2]) || in_triangle(p, c[0], c[2], c[3]) {
                    hits += 1;
                    if hits >= limit {
                        return hits;
                    }
                }
            }
        }
        hits
    }
}

/// Barycentric membership; degenerate triangles contain nothing.
fn in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let denom = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
    if denom.abs() < f32::EPSILON {
        return false;
    }
    let w1 = ((b.1 - c.1) * (p.0 - c.0) + (c.0 - b.0) * (p.1 - c.1)) / denom;
    let w2 = ((c.1 - a.1) * (p.0 - c.0) + (a.0 - c.0) * (p.1 - c.1)) / denom;
    let w3 = 1.0 - w1 - w2;
    let inside = |w: f32| (-BARYCENTRIC_EPSILON..=1.0 + BARYCENTRIC_EPSILON).contains(&w);
    inside(w1) && inside(w2) && inside(w3)
}

//! Binary obstacle grid with disc inflation.
//!
//! Cells are addressed as `GridCoord { x: column, y: row }`; columns run
//! along world x and rows along world z. World-to-grid conversion floors,
//! grid-to-world returns the cell center, so converting a cell to world and
//! back yields the same cell.

use crate::core::{GridCoord, WorldBounds, WorldPoint};

/// Obstacle occupancy over a rectangular ground-plane region.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleGrid {
    bounds: WorldBounds,
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Row-major occupancy
    cells: Vec<bool>,
}

impl ObstacleGrid {
    /// All-free grid covering `bounds`.
    pub fn new(bounds: WorldBounds, cell_size: f32) -> Self {
        let (cols, rows) = bounds.grid_size(cell_size);
        Self {
            bounds,
            cell_size,
            cols,
            rows,
            cells: vec![false; cols * rows],
        }
    }

    /// Rasterize obstacle points, marking every cell within
    /// `inflation_radius` cells (Euclidean) of a point as occupied.
    pub fn rasterize<I>(
        points: I,
        bounds: WorldBounds,
        cell_size: f32,
        inflation_radius: u32,
    ) -> Self
    where
        I: IntoIterator<Item = WorldPoint>,
    {
        let mut grid = Self::new(bounds, cell_size);
        if grid.cells.is_empty() {
            return grid;
        }
        for p in points {
            let center = grid.world_to_grid(p);
            grid.mark_disc(center, inflation_radius);
        }
        grid
    }

    /// Mark all in-bounds cells within `radius` cells of `center`.
    pub fn mark_disc(&mut self, center: GridCoord, radius: u32) {
        let r = radius as i32;
        let r_sq = (r as i64) * (r as i64);
        for y in (center.y - r)..=(center.y + r) {
            for x in (center.x - r)..=(center.x + r) {
                let coord = GridCoord::new(x, y);
                if coord.distance_squared(&center) <= r_sq {
                    self.set_occupied(coord, true);
                }
            }
        }
    }

    /// Set one cell; out-of-bounds writes are ignored.
    #[inline]
    pub fn set_occupied(&mut self, coord: GridCoord, occupied: bool) {
        if let Some(idx) = self.index(coord) {
            self.cells[idx] = occupied;
        }
    }

    /// Occupancy of a cell. Cells outside the grid are reported free; the
    /// grid always covers the robot and its path, so anything outside is
    /// unobserved rather than blocked.
    #[inline]
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some_and(|idx| self.cells[idx])
    }

    #[inline]
    pub fn is_occupied_world(&self, p: WorldPoint) -> bool {
        self.is_occupied(self.world_to_grid(p))
    }

    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as usize) < self.cols && (coord.y as usize) < self.rows
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.cols + coord.x as usize)
        } else {
            None
        }
    }

    /// Convert world coordinates to grid coordinates.
    #[inline]
    pub fn world_to_grid(&self, p: WorldPoint) -> GridCoord {
        let x = ((p.x - self.bounds.min_x) / self.cell_size).floor() as i32;
        let y = ((p.z - self.bounds.min_z) / self.cell_size).floor() as i32;
        GridCoord::new(x, y)
    }

    /// Convert grid coordinates to world coordinates (cell center).
    #[inline]
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.bounds.min_x + (coord.x as f32 + 0.5) * self.cell_size,
            self.bounds.min_z + (coord.y as f32 + 0.5) * self.cell_size,
        )
    }

    /// `(cols, rows)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Coordinates of all occupied cells in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &occupied)| occupied)
            .map(move |(idx, _)| GridCoord::new((idx % cols) as i32, (idx / cols) as i32))
    }
}

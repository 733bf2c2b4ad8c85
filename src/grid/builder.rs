//! Obstacle grid rebuild from a depth frame.
//!
//! The grid is rebuilt from scratch on every call: bounds and dimensions are
//! recomputed, there is no incremental update.

use crate::config::{AnveshanConfig, DepthSection, FilterSection};
use crate::core::{WorldBounds, WorldPoint};
use crate::sensing::{PoseSnapshot, RayLookup};

use super::cloud::{FilterStats, PointCloud};
use super::obstacle::ObstacleGrid;

/// Positions that must lie inside the rebuilt grid regardless of the cloud.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridAnchors {
    /// Current robot position
    pub robot: Option<WorldPoint>,
    /// First waypoint of the active solution
    pub path_start: Option<WorldPoint>,
    /// Active exploration target
    pub target: Option<WorldPoint>,
}

impl GridAnchors {
    fn iter(&self) -> impl Iterator<Item = WorldPoint> {
        [self.robot, self.path_start, self.target].into_iter().flatten()
    }
}

/// Result of one grid rebuild.
#[derive(Clone, Debug)]
pub struct GridRebuild {
    pub grid: ObstacleGrid,
    /// Cleaned obstacle cloud the grid was rasterized from
    pub cloud: PointCloud,
    pub stats: FilterStats,
}

/// Builds obstacle grids from depth frames.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    depth: DepthSection,
    filter: FilterSection,
    cell_size: f32,
    inflation_radius: u32,
    margin: f32,
}

impl GridBuilder {
    pub fn new(config: &AnveshanConfig) -> Self {
        Self {
            depth: config.depth.clone(),
            filter: config.filter.clone(),
            cell_size: config.grid.cell_size,
            inflation_radius: config.grid.inflation_radius_cells,
            margin: config.bounds_margin(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Full pipeline: reproject, clean, bound and rasterize.
    ///
    /// Returns `None` when the frame cannot be used (empty depth image or a
    /// lookup table that does not cover it).
    pub fn rebuild(
        &self,
        snapshot: &PoseSnapshot,
        lookup: &RayLookup,
        anchors: GridAnchors,
    ) -> Option<GridRebuild> {
        if snapshot.depth.is_empty() || !lookup.covers(&snapshot.depth) {
            tracing::debug!(
                "Grid rebuild declined: depth {}x{}, lookup {}x{}",
                snapshot.depth.width(),
                snapshot.depth.height(),
                lookup.width(),
                lookup.height()
            );
            return None;
        }

        let raw = self.reproject(snapshot, lookup);
        let (cloud, stats) = self.clean(raw);
        let bounds = self.bounds(&cloud, anchors);
        let grid = ObstacleGrid::rasterize(
            cloud.ground_points(),
            bounds,
            self.cell_size,
            self.inflation_radius,
        );

        tracing::trace!(
            "Grid rebuilt: {}x{} cells, {} occupied, points raw={} voxel={} iqr={} sor={}",
            grid.cols(),
            grid.rows(),
            grid.occupied_count(),
            stats.raw,
            stats.voxel,
            stats.iqr,
            stats.sor
        );

        Some(GridRebuild { grid, cloud, stats })
    }

    /// Reproject every `stride`-th pixel into the world and keep the height band.
    pub fn reproject(&self, snapshot: &PoseSnapshot, lookup: &RayLookup) -> PointCloud {
        let image = &snapshot.depth;
        let stride = self.depth.stride.max(1);
        let mut cloud = PointCloud::with_capacity(
            (image.width() / stride + 1) * (image.height() / stride + 1),
        );

        for r in (0..image.height()).step_by(stride) {
            let ray_y = lookup.ray_y(r);
            let row = image.row(r);
            for c in (0..image.width()).step_by(stride) {
                let d = row[c];
                if !(d > self.depth.min_depth && d < self.depth.max_depth) {
                    continue;
                }
                let world = snapshot.to_world(lookup.ray_x(c) * d, ray_y * d, d);
                // y grows downward
                if world.y >= self.depth.height_lower && world.y <= self.depth.height_upper {
                    cloud.push(world);
                }
            }
        }
        cloud
    }

    /// Run the enabled cleaning stages in order.
    pub fn clean(&self, mut cloud: PointCloud) -> (PointCloud, FilterStats) {
        let mut stats = FilterStats {
            raw: cloud.len(),
            ..Default::default()
        };

        cloud.retain_finite();
        stats.finite = cloud.len();

        if self.filter.enable_voxel {
            cloud = cloud.voxel_downsample(self.filter.voxel_leaf);
        }
        stats.voxel = cloud.len();

        if self.filter.enable_iqr {
            cloud = cloud.iqr_filter(self.filter.iqr_multiplier);
        }
        stats.iqr = cloud.len();

        if self.filter.enable_sor {
            cloud = cloud
                .statistical_outlier_removal(self.filter.sor_neighbors, self.filter.sor_std_ratio);
        }
        stats.sor = cloud.len();

        (cloud, stats)
    }

    /// Grid bounds for a cleaned cloud and the anchors.
    pub fn bounds(&self, cloud: &PointCloud, anchors: GridAnchors) -> WorldBounds {
        WorldBounds::enclosing(cloud.ground_points(), anchors.iter(), self.margin)
    }

    /// Rasterize an already cleaned cloud (e.g. the planner's map cloud).
    pub fn rasterize_cloud(&self, cloud: &PointCloud, anchors: GridAnchors) -> ObstacleGrid {
        let bounds = self.bounds(cloud, anchors);
        ObstacleGrid::rasterize(
            cloud.ground_points(),
            bounds,
            self.cell_size,
            self.inflation_radius,
        )
    }
}

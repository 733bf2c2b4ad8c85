//! Obstacle grid construction.
//!
//! Turns a depth frame into a binary obstacle grid:
//! 1. Reproject subsampled pixels and keep a height band ([`GridBuilder`])
//! 2. Clean the cloud: non-finite, voxel, IQR and statistical filters ([`PointCloud`])
//! 3. Bound the cloud and anchors ([`crate::core::WorldBounds`])
//! 4. Rasterize with disc inflation ([`ObstacleGrid`])

mod builder;
mod cloud;
mod obstacle;

pub use builder::{GridAnchors, GridBuilder, GridRebuild};
pub use cloud::{FilterStats, PointCloud};
pub use obstacle::ObstacleGrid;

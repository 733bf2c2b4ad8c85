//! Core types shared across the exploration engine.
//!
//! Coordinates follow the camera convention of the SLAM tracker:
//! - **X-axis**: right
//! - **Y-axis**: down (larger values are lower)
//! - **Z-axis**: forward
//!
//! The ground plane is therefore `(x, z)`, and headings are measured in that
//! plane.
//!
//! ## Type Categories
//!
//! - [`WorldPoint`]: ground-plane position in meters
//! - [`GridCoord`]: integer cell indices (`x` = column, `y` = row)
//! - [`Point3`]: 3-D world point from depth reprojection
//! - [`WorldBounds`]: axis-aligned ground-plane rectangle covering the grid
//! - [`Waypoint`]: one element of a solution path, including the in-place
//!   rotation and stop commands for the motion executor

mod bounds;
mod point;
mod waypoint;

pub use bounds::WorldBounds;
pub use point::{GridCoord, Point3, WorldPoint};
pub use waypoint::{SolutionPath, Waypoint};

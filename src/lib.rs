//! # Anveshan
//!
//! Autonomous exploration engine for robots driven by a depth-camera SLAM
//! tracker.
//!
//! ## Overview
//!
//! Anveshan turns the tracker's stream of depth frames and camera poses into a
//! 2D obstacle grid, keeps the planner's path valid against it, and sequences
//! a whole mapping session:
//!
//! - **Grid building**: height-band reprojection, voxel, IQR and statistical
//!   outlier filtering, inflated rasterization
//! - **Collision checks**: bare cells or an oriented rectangular footprint
//! - **Replanning**: arrival and look-ahead collision triggers every cycle
//! - **State machine**: explore, sweep leftover targets, return home, wait for
//!   global bundle adjustment, save
//!
//! Path planning, SLAM and map storage stay with the host system behind the
//! traits in [`planning`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use anveshan::{AnveshanConfig, Collaborators, spawn_exploration};
//!
//! let config = AnveshanConfig::load(Path::new("anveshan.toml"))?;
//! let thread = spawn_exploration(&config, collaborators)?;
//!
//! // Tracker thread, for every frame
//! thread.handle.push_frame(depth, camera_to_world, camera_center);
//!
//! // Motion executor
//! let waypoints = thread.handle.path();
//!
//! let report = thread.join()?;
//! ```
//!
//! ## Coordinate System
//!
//! Camera convention: X right, Y down, Z forward. The ground plane is
//! `(x, z)`.

pub mod collision;
pub mod config;
pub mod core;
pub mod error;
pub mod exploration;
pub mod grid;
pub mod planning;
pub mod sensing;
pub mod shared;
pub mod threads;
pub mod utils;

pub use config::{AnveshanConfig, PlanningMode};
pub use core::{GridCoord, Point3, SolutionPath, Waypoint, WorldBounds, WorldPoint};
pub use error::{AnveshanError, Result};
pub use exploration::{
    Collaborators, ExplorationReport, ExplorationState, Explorer, ExplorerHandle, ReplanDecision,
    ReplanPolicy, shorten_solution,
};
pub use grid::{GridBuilder, ObstacleGrid, PointCloud};
pub use planning::{
    Color, DrawSink, MapPersistence, MappingBackend, PathPlanner, PlanStart, PointCloudSupplier,
    Tracker, TrackingState,
};
pub use sensing::{DepthImage, FrameCache, RayLookup};
pub use threads::{ExplorationThread, spawn_exploration};

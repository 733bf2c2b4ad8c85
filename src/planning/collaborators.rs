//! Traits implemented by the host SLAM system.
//!
//! All collaborators are shared between the tracker thread and the
//! exploration thread, so every method takes `&self`; implementations use
//! interior mutability where they need it.

use std::sync::Arc;

use crate::core::{Point3, SolutionPath, WorldPoint};
use crate::error::Result;
use crate::grid::PointCloud;
use crate::sensing::RayLookup;

/// Tracker health as reported by the SLAM front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingState {
    Uninitialized,
    Ok,
    Lost,
}

/// Visual SLAM tracker.
pub trait Tracker: Send + Sync {
    fn state(&self) -> TrackingState;

    /// Per-column / per-row normalized ray directions of the depth camera.
    ///
    /// `None` until the tracker has loaded its calibration.
    fn ray_lookup(&self) -> Option<Arc<RayLookup>>;
}

/// Source of the obstacle cloud passed to the planner.
pub trait PointCloudSupplier: Send + Sync {
    /// Recompute the cloud from the current map. Potentially expensive.
    fn recompute_point_cloud(&self) -> PointCloud;
}

/// Start state of a planning query. `yaw` is ignored by planar planners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanStart {
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
}

impl PlanStart {
    pub fn new(x: f32, z: f32, yaw: f32) -> Self {
        Self { x, z, yaw }
    }

    #[inline]
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.z)
    }
}

/// External path planner (planar or oriented).
pub trait PathPlanner: Send + Sync {
    /// Plan from `start` towards the planner's own choice of frontier.
    fn plan(&self, start: PlanStart, cloud: &PointCloud) -> Option<SolutionPath>;

    /// Plan from `start` to `goal`.
    fn plan_to(&self, start: PlanStart, goal: WorldPoint, cloud: &PointCloud)
    -> Option<SolutionPath>;

    /// Next unvisited area worth exploring, if any.
    fn find_unvisited_target(&self) -> Option<WorldPoint>;

    /// Reset the planner between targets; `keep_visited` retains the record of
    /// areas already covered.
    fn reset(&self, keep_visited: bool);

    /// Goal of the most recent plan.
    fn current_target(&self) -> Option<WorldPoint>;

    /// Draw the most recent plan.
    fn render_planned_path(&self, sink: &mut dyn DrawSink);
}

/// Mapping backend signals for global bundle adjustment.
pub trait MappingBackend: Send + Sync {
    fn is_global_ba_running(&self) -> bool;
    fn is_global_ba_finished(&self) -> bool;
}

/// Final map save.
pub trait MapPersistence: Send + Sync {
    fn save_map(&self) -> Result<()>;
}

/// RGB color, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Visualization layer receiving debug geometry.
pub trait DrawSink {
    fn draw_point(&mut self, point: Point3, color: Color);
}

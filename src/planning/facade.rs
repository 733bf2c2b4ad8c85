use std::sync::Arc;

use crate::collision::StateValidator;
use crate::core::{Waypoint, WorldPoint};

use super::collaborators::{DrawSink, PathPlanner, PlanStart, PointCloudSupplier};

/// Planner plus the cloud supplier it is fed from.
///
/// Fetches a fresh cloud for every query and rejects plans whose waypoints
/// do not match the planning mode.
#[derive(Clone)]
pub struct PlannerFacade {
    planner: Arc<dyn PathPlanner>,
    supplier: Arc<dyn PointCloudSupplier>,
    validator: StateValidator,
}

impl PlannerFacade {
    pub fn new(
        planner: Arc<dyn PathPlanner>,
        supplier: Arc<dyn PointCloudSupplier>,
        validator: StateValidator,
    ) -> Self {
        Self {
            planner,
            supplier,
            validator,
        }
    }

    /// Plan from `start`, towards `goal` when given, else to a planner-chosen
    /// frontier.
    pub fn plan(&self, start: PlanStart, goal: Option<WorldPoint>) -> Option<Vec<Waypoint>> {
        let cloud = self.supplier.recompute_point_cloud();
        tracing::debug!(
            "Planning from ({:.2}, {:.2}) with {} map points, goal {:?}",
            start.x,
            start.z,
            cloud.len(),
            goal
        );

        let path = match goal {
            Some(goal) => self.planner.plan_to(start, goal, &cloud),
            None => self.planner.plan(start, &cloud),
        }?;

        if path.iter().all(Waypoint::is_command) {
            tracing::debug!("Planner returned a path without poses");
            return None;
        }
        if let Some(bad) = path.iter().find(|w| !self.validator.accepts(w)) {
            tracing::warn!(
                "Planner returned {:?} in {:?} mode, discarding plan",
                bad,
                self.validator.mode()
            );
            return None;
        }

        tracing::info!("Planned path with {} waypoints", path.len());
        Some(path)
    }

    #[inline]
    pub fn find_unvisited_target(&self) -> Option<WorldPoint> {
        self.planner.find_unvisited_target()
    }

    #[inline]
    pub fn reset(&self, keep_visited: bool) {
        self.planner.reset(keep_visited);
    }

    #[inline]
    pub fn current_target(&self) -> Option<WorldPoint> {
        self.planner.current_target()
    }

    #[inline]
    pub fn render_planned_path(&self, sink: &mut dyn DrawSink) {
        self.planner.render_planned_path(sink);
    }

    #[inline]
    pub fn validator(&self) -> &StateValidator {
        &self.validator
    }
}

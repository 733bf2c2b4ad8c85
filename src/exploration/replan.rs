//! Replanning triggers evaluated once per follow cycle.

use crate::collision::StateValidator;
use crate::config::AnveshanConfig;
use crate::core::{Waypoint, WorldPoint};
use crate::grid::{GridAnchors, GridBuilder};
use crate::sensing::{FrameCache, RayLookup};
use crate::shared::SharedGrid;

/// Outcome of one replanning check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplanDecision {
    /// Pose, depth or lookup tables not available yet
    NotReady,
    /// Close enough to the active target
    Arrived,
    /// Too many waypoints collide with the rebuilt grid
    PathBlocked { collisions: usize },
    /// Current path stays valid this cycle
    Clear,
}

impl ReplanDecision {
    /// Whether the active path has to be discarded.
    pub fn requires_replan(&self) -> bool {
        matches!(
            self,
            ReplanDecision::Arrived | ReplanDecision::PathBlocked { .. }
        )
    }
}

/// Arrival and look-ahead collision triggers.
#[derive(Clone, Debug)]
pub struct ReplanPolicy {
    builder: GridBuilder,
    validator: StateValidator,
    arrival_distance_sq: f32,
    collision_threshold: usize,
}

impl ReplanPolicy {
    pub fn new(config: &AnveshanConfig) -> Self {
        Self {
            builder: GridBuilder::new(config),
            validator: StateValidator::from_config(&config.robot),
            arrival_distance_sq: config.replan.arrival_distance_sq,
            collision_threshold: config.replan.path_collision_threshold.max(1),
        }
    }

    #[inline]
    pub fn validator(&self) -> &StateValidator {
        &self.validator
    }

    /// Evaluate the triggers against the latest frame.
    ///
    /// Rebuilds the obstacle grid from the frame and stores it in `grid_slot`
    /// unless the robot has already arrived.
    pub fn needs_replan(
        &self,
        frames: &FrameCache,
        lookup: Option<&RayLookup>,
        solution: &[Waypoint],
        target: Option<WorldPoint>,
        grid_slot: &SharedGrid,
    ) -> ReplanDecision {
        let Some(snapshot) = frames.snapshot() else {
            return ReplanDecision::NotReady;
        };
        let center = snapshot.ground_position();

        if let Some(target) = target
            && center.distance_squared(&target) < self.arrival_distance_sq
        {
            tracing::debug!(
                "Close to target ({:.2}, {:.2}), replanning",
                target.x,
                target.z
            );
            return ReplanDecision::Arrived;
        }

        let Some(lookup) = lookup else {
            return ReplanDecision::NotReady;
        };
        let anchors = GridAnchors {
            robot: Some(center),
            path_start: solution.iter().find_map(Waypoint::position),
            target,
        };
        let Some(rebuild) = self.builder.rebuild(&snapshot, lookup, anchors) else {
            return ReplanDecision::NotReady;
        };

        let mut collisions = 0;
        for waypoint in solution.iter().filter(|w| !w.is_command()) {
            if !self.validator.is_waypoint_valid(&rebuild.grid, waypoint) {
                collisions += 1;
                if collisions >= self.collision_threshold {
                    break;
                }
            }
        }
        grid_slot.store(rebuild.grid);

        if collisions >= self.collision_threshold {
            tracing::debug!("Path blocked: {} waypoints collide", collisions);
            ReplanDecision::PathBlocked { collisions }
        } else {
            ReplanDecision::Clear
        }
    }
}

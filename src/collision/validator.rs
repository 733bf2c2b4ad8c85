use crate::config::{PlanningMode, RobotSection};
use crate::core::{GridCoord, Waypoint};
use crate::grid::ObstacleGrid;

use super::footprint::{Footprint, FootprintChecker};

/// State validity check for the active planning mode, chosen once at
/// construction.
#[derive(Clone, Debug)]
pub enum StateValidator {
    /// Bare cell lookup; the grid is already inflated for the robot radius.
    Planar,
    /// Oriented footprint test using the waypoint heading.
    Oriented(FootprintChecker),
}

impl StateValidator {
    pub fn from_config(robot: &RobotSection) -> Self {
        match robot.mode {
            PlanningMode::Planar => StateValidator::Planar,
            PlanningMode::Oriented => StateValidator::Oriented(FootprintChecker::new(
                Footprint::new(robot.half_length_cells, robot.half_width_cells),
                robot.footprint_collision_threshold,
            )),
        }
    }

    pub fn mode(&self) -> PlanningMode {
        match self {
            StateValidator::Planar => PlanningMode::Planar,
            StateValidator::Oriented(_) => PlanningMode::Oriented,
        }
    }

    /// Whether a cell (with optional heading) is free.
    ///
    /// In oriented mode a missing heading falls back to the bare cell test.
    pub fn is_state_valid(&self, grid: &ObstacleGrid, cell: GridCoord, yaw: Option<f32>) -> bool {
        match (self, yaw) {
            (StateValidator::Oriented(checker), Some(yaw)) => {
                checker.is_pose_valid(grid, cell.x, cell.y, yaw)
            }
            _ => !grid.is_occupied(cell),
        }
    }

    /// Whether a waypoint is free. Commands are always valid.
    pub fn is_waypoint_valid(&self, grid: &ObstacleGrid, waypoint: &Waypoint) -> bool {
        match waypoint.position() {
            Some(p) => self.is_state_valid(grid, grid.world_to_grid(p), waypoint.yaw()),
            None => true,
        }
    }

    /// Whether a waypoint carries the data this mode expects.
    pub fn accepts(&self, waypoint: &Waypoint) -> bool {
        match waypoint {
            Waypoint::Pose { yaw, .. } => match self {
                StateValidator::Planar => yaw.is_none(),
                StateValidator::Oriented(_) => yaw.is_some(),
            },
            _ => true,
        }
    }
}

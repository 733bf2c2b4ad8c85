//! Solution path elements.

use super::point::WorldPoint;

/// Ordered waypoints handed to the motion executor.
pub type SolutionPath = Vec<Waypoint>;

/// One element of a solution path.
///
/// Besides regular poses the path carries two commands for the motion
/// executor: rotate in place (used once home to let the tracker close the
/// loop) and stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waypoint {
    /// Ground-plane target; `yaw` is set only by oriented planners.
    Pose { x: f32, z: f32, yaw: Option<f32> },
    /// Rotate on the spot.
    RotateInPlace,
    /// Stop moving.
    Stop,
}

impl Waypoint {
    /// Planar waypoint.
    #[inline]
    pub fn planar(x: f32, z: f32) -> Self {
        Waypoint::Pose { x, z, yaw: None }
    }

    /// Waypoint with heading.
    #[inline]
    pub fn oriented(x: f32, z: f32, yaw: f32) -> Self {
        Waypoint::Pose {
            x,
            z,
            yaw: Some(yaw),
        }
    }

    /// Position of a pose waypoint; `None` for commands.
    #[inline]
    pub fn position(&self) -> Option<WorldPoint> {
        match *self {
            Waypoint::Pose { x, z, .. } => Some(WorldPoint::new(x, z)),
            _ => None,
        }
    }

    #[inline]
    pub fn yaw(&self) -> Option<f32> {
        match *self {
            Waypoint::Pose { yaw, .. } => yaw,
            _ => None,
        }
    }

    #[inline]
    pub fn is_command(&self) -> bool {
        !matches!(self, Waypoint::Pose { .. })
    }

    /// Numeric encoding used by executors that expect plain vectors:
    /// `[-1, -1]` rotates, `[-2, -2]` stops.
    pub fn as_legacy(&self) -> Vec<f32> {
        match *self {
            Waypoint::Pose { x, z, yaw: None } => vec![x, z],
            Waypoint::Pose {
                x,
                z,
                yaw: Some(yaw),
            } => vec![x, z, yaw],
            Waypoint::RotateInPlace => vec![-1.0, -1.0],
            Waypoint::Stop => vec![-2.0, -2.0],
        }
    }
}

//! Solution path maintenance.

use crate::core::{Waypoint, WorldPoint};

/// Drop the waypoints the robot has already passed.
///
/// Scans pose waypoints from the front until one lies farther than
/// `lookahead_sq` (squared meters) or a command is reached, and keeps the
/// path from the closest scanned waypoint on. The closest waypoint is dropped
/// too once the robot has moved past it towards the next one.
///
/// Returns the number of waypoints removed.
pub fn shorten_solution(
    path: &mut Vec<Waypoint>,
    camera_center: WorldPoint,
    lookahead_sq: f32,
) -> usize {
    let mut closest: Option<(usize, f32)> = None;
    for (i, waypoint) in path.iter().enumerate() {
        let Some(p) = waypoint.position() else {
            break;
        };
        let d2 = p.distance_squared(&camera_center);
        if d2 > lookahead_sq {
            break;
        }
        if closest.is_none_or(|(_, best)| d2 < best) {
            closest = Some((i, d2));
        }
    }

    let Some((mut cut, _)) = closest else {
        return 0;
    };

    if let (Some(here), Some(next)) = (
        path[cut].position(),
        path.get(cut + 1).and_then(Waypoint::position),
    ) {
        let along = (camera_center.x - here.x) * (next.x - here.x)
            + (camera_center.z - here.z) * (next.z - here.z);
        if along > 0.0 {
            cut += 1;
        }
    }

    path.drain(..cut);
    cut
}

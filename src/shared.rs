//! Shared state between the sensing side, the exploration thread and
//! external readers (motion executor, visualization).
//!
//! Each resource has its own lock. Readers take whole copies; no lock is
//! held across a call into a collaborator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::core::{Waypoint, WorldPoint};
use crate::exploration::shorten_solution;
use crate::grid::ObstacleGrid;

/// Latest obstacle grid, rebuilt wholesale by the exploration thread.
#[derive(Debug, Default)]
pub struct SharedGrid {
    grid: Mutex<Option<ObstacleGrid>>,
}

impl SharedGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the grid.
    pub fn store(&self, grid: ObstacleGrid) {
        *self.grid.lock() = Some(grid);
    }

    /// Drop the grid (obstacle state is cleared before returning home).
    pub fn clear(&self) {
        *self.grid.lock() = None;
    }

    /// Copy of the current grid.
    pub fn snapshot(&self) -> Option<ObstacleGrid> {
        self.grid.lock().clone()
    }

    /// Run `f` against the grid under the lock.
    pub fn with_grid<R>(&self, f: impl FnOnce(&ObstacleGrid) -> R) -> Option<R> {
        self.grid.lock().as_ref().map(f)
    }

    pub fn is_empty(&self) -> bool {
        self.grid.lock().is_none()
    }
}

/// Active solution path.
///
/// Written by the exploration thread, read by the motion executor.
#[derive(Debug, Default)]
pub struct SharedPath {
    waypoints: Mutex<Vec<Waypoint>>,
}

impl SharedPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole path.
    pub fn replace(&self, waypoints: Vec<Waypoint>) {
        *self.waypoints.lock() = waypoints;
    }

    /// Append one waypoint (used for executor commands).
    pub fn push(&self, waypoint: Waypoint) {
        self.waypoints.lock().push(waypoint);
    }

    pub fn clear(&self) {
        self.waypoints.lock().clear();
    }

    /// Copy of the path.
    pub fn snapshot(&self) -> Vec<Waypoint> {
        self.waypoints.lock().clone()
    }

    /// Position of the first pose waypoint.
    pub fn first_position(&self) -> Option<WorldPoint> {
        self.waypoints.lock().iter().find_map(Waypoint::position)
    }

    pub fn len(&self) -> usize {
        self.waypoints.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.lock().is_empty()
    }

    /// Drop waypoints the robot has already passed. Returns how many were
    /// removed.
    pub fn shorten(&self, camera_center: WorldPoint, lookahead_sq: f32) -> usize {
        shorten_solution(&mut self.waypoints.lock(), camera_center, lookahead_sq)
    }
}

/// Cooperative shutdown signal.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown.
    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check if shutdown is signaled.
    pub fn is_signaled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldBounds;

    #[test]
    fn test_grid_store_and_clear() {
        let shared = SharedGrid::new();
        assert!(shared.is_empty());
        assert!(shared.with_grid(|g| g.cols()).is_none());

        shared.store(ObstacleGrid::new(WorldBounds::new(0.0, 1.0, 0.0, 1.0), 0.25));
        assert_eq!(shared.with_grid(|g| g.cols()), Some(5));
        assert!(shared.snapshot().is_some());

        shared.clear();
        assert!(shared.snapshot().is_none());
    }

    #[test]
    fn test_path_first_position_skips_commands() {
        let path = SharedPath::new();
        assert!(path.first_position().is_none());

        path.replace(vec![Waypoint::RotateInPlace, Waypoint::planar(1.0, 2.0)]);
        assert_eq!(path.first_position(), Some(WorldPoint::new(1.0, 2.0)));

        path.push(Waypoint::Stop);
        assert_eq!(path.len(), 3);
        assert_eq!(path.snapshot().last(), Some(&Waypoint::Stop));
    }

    #[test]
    fn test_shutdown_flag_shared_between_clones() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        assert!(!other.is_signaled());
        flag.signal();
        assert!(other.is_signaled());
    }
}

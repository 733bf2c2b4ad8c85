//! Latest-frame cache shared between the tracker and the explorer.
//!
//! The producer replaces the whole snapshot on every frame; consumers copy
//! it out under the same lock, so pose, center and depth always belong to
//! the same frame.

use std::sync::Arc;

use nalgebra::{Matrix4, Vector3, Vector4};
use parking_lot::Mutex;

use crate::core::{Point3, WorldPoint};

use super::depth::DepthImage;

/// Everything the explorer needs from one tracked frame.
#[derive(Clone, Debug)]
pub struct PoseSnapshot {
    /// Camera-to-world rigid transform
    pub camera_to_world: Matrix4<f32>,
    /// Camera center in world coordinates
    pub camera_center: Vector3<f32>,
    /// Depth image of the frame (shared, never mutated after push)
    pub depth: Arc<DepthImage>,
}

impl PoseSnapshot {
    /// Camera position on the ground plane.
    #[inline]
    pub fn ground_position(&self) -> WorldPoint {
        WorldPoint::new(self.camera_center.x, self.camera_center.z)
    }

    /// Transform a camera-frame point into the world frame.
    #[inline]
    pub fn to_world(&self, x: f32, y: f32, z: f32) -> Point3 {
        let w = self.camera_to_world * Vector4::new(x, y, z, 1.0);
        Point3::new(w.x, w.y, w.z)
    }
}

/// Thread-safe holder of the most recent [`PoseSnapshot`].
#[derive(Debug, Default)]
pub struct FrameCache {
    latest: Mutex<Option<PoseSnapshot>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached frame (called by the tracker thread).
    pub fn push_frame(
        &self,
        depth: DepthImage,
        camera_to_world: Matrix4<f32>,
        camera_center: Vector3<f32>,
    ) {
        let snapshot = PoseSnapshot {
            camera_to_world,
            camera_center,
            depth: Arc::new(depth),
        };
        *self.latest.lock() = Some(snapshot);
    }

    /// Copy of the latest frame, or `None` before the first push.
    pub fn snapshot(&self) -> Option<PoseSnapshot> {
        self.latest.lock().clone()
    }

    /// Ground-plane camera position of the latest frame.
    pub fn camera_center(&self) -> Option<WorldPoint> {
        self.latest.lock().as_ref().map(PoseSnapshot::ground_position)
    }

    /// Drop the cached frame.
    pub fn clear(&self) {
        *self.latest.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    #[test]
    fn test_empty_cache() {
        let cache = FrameCache::new();
        assert!(cache.snapshot().is_none());
        assert!(cache.camera_center().is_none());
    }

    #[test]
    fn test_push_replaces_whole_snapshot() {
        let cache = FrameCache::new();
        cache.push_frame(
            DepthImage::zeros(4, 4),
            translation(1.0, 0.0, 2.0),
            Vector3::new(1.0, 0.0, 2.0),
        );
        cache.push_frame(
            DepthImage::zeros(8, 6),
            translation(3.0, 0.0, 4.0),
            Vector3::new(3.0, 0.0, 4.0),
        );

        let snapshot = cache.snapshot().unwrap();
        assert_eq!(snapshot.depth.width(), 8);
        assert_relative_eq!(snapshot.camera_to_world[(0, 3)], 3.0);
        assert_eq!(cache.camera_center(), Some(WorldPoint::new(3.0, 4.0)));

        cache.clear();
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_to_world_applies_pose() {
        let cache = FrameCache::new();
        cache.push_frame(
            DepthImage::zeros(1, 1),
            translation(1.0, -0.5, 2.0),
            Vector3::new(1.0, -0.5, 2.0),
        );
        let p = cache.snapshot().unwrap().to_world(0.5, 0.0, 1.0);
        assert_relative_eq!(p.x, 1.5);
        assert_relative_eq!(p.y, -0.5);
        assert_relative_eq!(p.z, 3.0);
    }

    #[test]
    fn test_concurrent_push_and_read() {
        let cache = Arc::new(FrameCache::new());
        let producer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let v = i as f32;
                    cache.push_frame(
                        DepthImage::zeros(2, 2),
                        translation(v, 0.0, v),
                        Vector3::new(v, 0.0, v),
                    );
                }
            })
        };

        for _ in 0..200 {
            if let Some(s) = cache.snapshot() {
                // Pose and center always come from the same push
                assert_relative_eq!(s.camera_to_world[(0, 3)], s.camera_center.x);
            }
        }
        producer.join().unwrap();
    }
}
